// Embeddings module
// Text-to-vector capability and its Ollama implementation

pub mod ollama;

pub use ollama::OllamaClient;

/// A model that turns text into fixed-length vectors
///
/// Implementations must return one vector per input, in input order, all of the same length.
pub trait TextEmbedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector"))
    }
}
