//! Model discovery and backend liveness.

use tracing::{info, warn};

use super::provider::LlmProvider;
use crate::core::config::defaults::FALLBACK_MODELS;
use crate::core::errors::RagError;

/// Installed model identifiers, or the fixed fallback list when the backend
/// cannot enumerate any.
pub async fn discover_models(provider: &dyn LlmProvider) -> Vec<String> {
    match provider.list_models().await {
        Ok(models) if !models.is_empty() => models.into_iter().map(|m| m.id).collect(),
        Ok(_) => {
            info!(provider = provider.name(), "No installed models reported, using fallback list");
            fallback_models()
        }
        Err(err) => {
            warn!(provider = provider.name(), "Model discovery failed: {}", err);
            fallback_models()
        }
    }
}

pub fn fallback_models() -> Vec<String> {
    FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
}

/// The configured model wins; otherwise the first discovered one.
pub fn resolve_model(configured: Option<&str>, discovered: &[String]) -> String {
    configured
        .map(str::to_string)
        .or_else(|| discovered.first().cloned())
        .unwrap_or_else(|| FALLBACK_MODELS[0].to_string())
}

/// Liveness probe. Runs before every index build and every generation call.
pub async fn ensure_backend_available(provider: &dyn LlmProvider) -> Result<(), RagError> {
    if provider.health_check().await? {
        return Ok(());
    }

    let instruction = match provider.name() {
        "ollama" => "Start the local model server with `ollama serve` and try again",
        "lmstudio" => "Start the LM Studio local server and try again",
        _ => "Start the local model server and try again",
    };
    warn!(provider = provider.name(), "Language model backend is not reachable");
    Err(RagError::BackendUnreachable(format!(
        "{} is not running. {}",
        provider.name(),
        instruction
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_model_takes_precedence() {
        let discovered = vec!["mistral".to_string(), "gemma".to_string()];
        assert_eq!(resolve_model(Some("phi3"), &discovered), "phi3");
        assert_eq!(resolve_model(None, &discovered), "mistral");
        assert_eq!(resolve_model(None, &[]), "llama2");
    }

    #[test]
    fn fallback_list_is_stable() {
        assert_eq!(fallback_models(), vec!["llama2", "mistral", "gemma"]);
    }
}
