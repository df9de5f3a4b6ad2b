pub mod config;
pub mod db;
pub mod hashtag;
pub mod note;
pub mod paths;
pub mod schema;
pub mod store;
