pub mod discovery;
pub mod lmstudio;
pub mod ollama;
pub mod provider;
pub mod types;


use std::sync::Arc;

use crate::core::config::{LlmSettings, ProviderKind};

pub use discovery::{discover_models, ensure_backend_available, resolve_model};
pub use lmstudio::LmStudioProvider;
pub use ollama::OllamaProvider;
pub use provider::LlmProvider;
pub use types::{GenerationParams, ProviderModel};

pub fn build_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    match settings.provider {
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(
            settings.base_url.clone(),
            settings.health_timeout,
        )
        .with_request_timeout(settings.timeout)),
        ProviderKind::LmStudio => Arc::new(LmStudioProvider::new(
            settings.base_url.clone(),
            settings.health_timeout,
        )
        .with_request_timeout(settings.timeout)),
    }
}
