use async_trait::async_trait;

use super::types::{GenerationParams, ProviderModel};
use crate::core::errors::RagError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama", "lmstudio")
    fn name(&self) -> &str;

    /// lightweight liveness probe; transport failures are `Ok(false)`
    async fn health_check(&self) -> Result<bool, RagError>;

    /// list installed models
    async fn list_models(&self) -> Result<Vec<ProviderModel>, RagError>;

    /// single-shot, non-streaming completion
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        model_id: &str,
    ) -> Result<String, RagError>;

    /// generate embeddings, one vector per input in input order
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError>;
}
