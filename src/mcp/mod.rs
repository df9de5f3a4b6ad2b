//! MCP server for noteseek
//!
//! Exposes semantic search and note reads as tools over stdio.

mod server;

pub use server::run_mcp_server;
