//! Positional character embedding
//!
//! A deterministic, training-free placeholder for a real sentence model.
//!
//! Key properties:
//! - No model file required
//! - Deterministic (same input → bit-identical output, across runs)
//! - Unicode-based (every code point contributes)
//! - Unit length for non-empty text, all zeros for empty text
//!
//! Everything downstream talks to the [`Embedder`] trait, so a trained model
//! can replace [`PositionalEmbedder`] without touching the index or engine.

use super::error::SearchError;

/// Embedding dimension (matching common sentence-transformer dims)
pub const EMBEDDING_DIM: usize = 384;

/// Weight applied to each code point before accumulation
const CHAR_SCALE: f32 = 0.001;

/// One fixed-length vector per piece of text.
pub type Embedding = Vec<f32>;

/// Text-to-vector backend.
pub trait Embedder: Send + Sync {
    /// Short backend name for logs and status output
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// One vector per input, in input order
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>, SearchError>;

    fn embed_single(&self, text: &str) -> Result<Embedding, SearchError> {
        self.embed(&[text])?
            .pop()
            .ok_or_else(|| SearchError::Embedding("embedder returned no vector".to_string()))
    }
}

/// Positional Character Embedding
///
/// Algorithm:
/// 1. Walk the text's characters
/// 2. Add `code_point * CHAR_SCALE` to slot `position % dimension`
/// 3. L2 normalize, unless the norm is zero (empty text)
#[derive(Debug, Clone)]
pub struct PositionalEmbedder {
    dimension: usize,
}

impl PositionalEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(EMBEDDING_DIM)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut acc = vec![0.0f32; self.dimension];
        for (i, c) in text.chars().enumerate() {
            acc[i % self.dimension] += c as u32 as f32 * CHAR_SCALE;
        }

        let norm = l2_norm(&acc);
        if norm > 0.0 {
            for val in &mut acc {
                *val /= norm;
            }
        }
        acc
    }
}

impl Default for PositionalEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for PositionalEmbedder {
    fn name(&self) -> &str {
        "positional"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>, SearchError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two embeddings
///
/// Zero whenever either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

/// Cosine similarity with both norms already known.
pub fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    if norm_a > 0.0 && norm_b > 0.0 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
