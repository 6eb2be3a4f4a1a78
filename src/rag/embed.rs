//! Embedding provider.
//!
//! `Real` wraps `fastembed::TextEmbedding` (AllMiniLML6V2, 384-dim).
//! `Stub` returns deterministic hash-based vectors so tests and offline
//! runs never hit the network. `TextEmbedding::embed` requires `&mut self`,
//! so the real variant is kept inside a `Mutex`.

use std::sync::Mutex;

use anyhow::Result;
use sha2::{Digest, Sha256};

/// Embedding dimensionality for AllMiniLML6V2.
pub const EMBEDDING_DIM: usize = 384;

pub enum Embedder {
    Real(Mutex<fastembed::TextEmbedding>),
    Stub,
}

impl Embedder {
    /// Initialise the embedder. Returns `Stub` when `PARLEY_EMBEDDER_STUB=1`
    /// is set or the model fails to load (e.g. no network).
    pub fn init() -> Self {
        if std::env::var("PARLEY_EMBEDDER_STUB")
            .map(|v| v == "1")
            .unwrap_or(false)
        {
            tracing::info!("stub embedder active (PARLEY_EMBEDDER_STUB=1)");
            return Embedder::Stub;
        }

        match fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false),
        ) {
            Ok(model) => {
                tracing::info!("AllMiniLML6V2 embedding model loaded");
                Embedder::Real(Mutex::new(model))
            }
            Err(e) => {
                tracing::warn!("embedding model unavailable ({e}), falling back to stub");
                Embedder::Stub
            }
        }
    }

    /// Embed a batch of strings into 384-dim float32 vectors.
    ///
    /// A failed batch is an error, never a fallback: mixing hash vectors
    /// into an index of model vectors would silently break similarity.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<[f32; EMBEDDING_DIM]>> {
        match self {
            Embedder::Real(mutex) => {
                let mut model = mutex.lock().expect("embedder mutex poisoned");
                let embeddings = model.embed(texts.to_vec(), None)?;
                Ok(embeddings
                    .into_iter()
                    .map(|v| {
                        let mut arr = [0f32; EMBEDDING_DIM];
                        let len = v.len().min(EMBEDDING_DIM);
                        arr[..len].copy_from_slice(&v[..len]);
                        arr
                    })
                    .collect())
            }
            Embedder::Stub => Ok(texts.iter().map(|t| hash_embed(t)).collect()),
        }
    }

    pub fn embed_one(&self, text: &str) -> Result<[f32; EMBEDDING_DIM]> {
        Ok(self
            .embed(std::slice::from_ref(&text.to_string()))?
            .into_iter()
            .next()
            .unwrap_or([0f32; EMBEDDING_DIM]))
    }
}

/// Deterministic 384-dim vector from SHA-256 of the text.
fn hash_embed(text: &str) -> [f32; EMBEDDING_DIM] {
    let digest = Sha256::digest(text.as_bytes());
    let mut arr = [0f32; EMBEDDING_DIM];
    for (i, f) in arr.iter_mut().enumerate() {
        let byte = digest[i % 32] as f32;
        *f = (byte / 255.0) * 2.0 - 1.0;
    }
    arr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_embedding_is_deterministic() {
        let embedder = Embedder::Stub;
        let a = embedder.embed_one("hello world").unwrap();
        let b = embedder.embed_one("hello world").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stub_embedding_varies_by_text() {
        let embedder = Embedder::Stub;
        let a = embedder.embed_one("hello world").unwrap();
        let b = embedder.embed_one("goodbye world").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_embed_batch_size() {
        let embedder = Embedder::Stub;
        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let embeddings = embedder.embed(&texts).unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[0].len(), EMBEDDING_DIM);
    }
}
