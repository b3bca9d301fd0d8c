//! Embedding seam: the pipeline treats vector computation as an external
//! service behind [`EmbeddingProvider`].

use async_trait::async_trait;
use rig::embeddings::embedding::EmbeddingModel;

use crate::error::RagError;

/// Batch text-to-vector interface.
///
/// Implementations must be deterministic for identical input and fail with
/// [`RagError::Embedding`] on provider errors; the pipeline never substitutes
/// zero vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector length produced by this provider.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of texts, one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let batch = [text.to_string()];
        let mut vectors = self.embed_batch(&batch).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no vectors".to_string()))
    }
}

/// Deterministic hash-based provider for tests and offline demos.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 8 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimensions))
            .collect())
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i as u32) * 8) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect()
}

/// Adapter exposing any `rig` [`EmbeddingModel`] as an [`EmbeddingProvider`].
pub struct RigEmbeddingProvider<M> {
    model: M,
}

impl<M> RigEmbeddingProvider<M>
where
    M: EmbeddingModel + Send + Sync,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M> EmbeddingProvider for RigEmbeddingProvider<M>
where
    M: EmbeddingModel + Send + Sync,
{
    fn dimensions(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let embeddings = self
            .model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        Ok(embeddings
            .into_iter()
            .map(|embedding| embedding.vec.into_iter().map(|value| value as f32).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::embeddings::embedding::{Embedding, EmbeddingError};

    #[tokio::test]
    async fn mock_provider_is_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
        assert_eq!(first[0].len(), provider.dimensions());
    }

    #[derive(Clone)]
    struct TinyModel;

    impl EmbeddingModel for TinyModel {
        const MAX_DOCUMENTS: usize = 16;

        type Client = ();

        fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
            TinyModel
        }

        fn ndims(&self) -> usize {
            2
        }

        fn embed_texts(
            &self,
            texts: impl IntoIterator<Item = String> + Send,
        ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send
        {
            let docs: Vec<String> = texts.into_iter().collect();
            async move {
                Ok(docs
                    .into_iter()
                    .map(|document| Embedding {
                        vec: vec![document.len() as f64, 1.0],
                        document,
                    })
                    .collect())
            }
        }
    }

    #[tokio::test]
    async fn rig_adapter_converts_vectors() {
        let provider = RigEmbeddingProvider::new(TinyModel);
        assert_eq!(provider.dimensions(), 2);

        let vectors = provider
            .embed_batch(&["abc".to_string(), "de".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![3.0, 1.0], vec![2.0, 1.0]]);

        let single = provider.embed("abcd").await.unwrap();
        assert_eq!(single, vec![4.0, 1.0]);
    }
}
