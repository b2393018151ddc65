use std::sync::Arc;

use crate::core::config::{AppPaths, AppSettings, ConfigService, EmbeddingBackend};
use crate::llm::{self, GenerationParams, LlmProvider};
use crate::rag::{AnswerGenerator, Embedder, HashEmbedder, ProviderEmbedder};
use crate::session::{Session, SharedSession};
use crate::source::ProfileScraper;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the loaded settings, the language model backend, the profile
/// scraper and the single conversation session.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub provider: Arc<dyn LlmProvider>,
    pub scraper: Arc<ProfileScraper>,
    pub session: SharedSession,
}

impl AppState {
    /// Loads configuration, connects the configured backend, resolves the
    /// generation model and creates an empty session.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let settings = ConfigService::new(paths)
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let provider = llm::build_provider(&settings.llm);
        let embedder = build_embedder(&settings, provider.clone())?;

        Self::assemble(settings, provider, embedder).await
    }

    /// Builds the state around an already constructed backend and embedder.
    pub async fn assemble(
        settings: AppSettings,
        provider: Arc<dyn LlmProvider>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<Self>, InitializationError> {
        let model = match settings.llm.model.as_deref() {
            Some(configured) => configured.to_string(),
            None => {
                let discovered = llm::discover_models(provider.as_ref()).await;
                llm::resolve_model(None, &discovered)
            }
        };
        tracing::info!(
            provider = provider.name(),
            model = %model,
            embedder = embedder.model_name(),
            "Language model backend configured"
        );

        let generator = AnswerGenerator::new(
            provider.clone(),
            model,
            GenerationParams::from(&settings.llm),
            settings.llm.timeout,
            settings.rag.history_window,
        );
        let session = Session::new(embedder, generator, &settings.rag)
            .map_err(|e| InitializationError::Session(e.into()))?
            .into_shared();

        let scraper = ProfileScraper::new(&settings.scraper)
            .map_err(|e| InitializationError::Scraper(e.into()))?;

        Ok(Arc::new(AppState {
            settings: Arc::new(settings),
            provider,
            scraper: Arc::new(scraper),
            session,
        }))
    }
}

fn build_embedder(
    settings: &AppSettings,
    provider: Arc<dyn LlmProvider>,
) -> Result<Arc<dyn Embedder>, InitializationError> {
    match settings.embedding.backend {
        EmbeddingBackend::Hash => {
            let embedder = HashEmbedder::new(settings.embedding.dimension)
                .map_err(|e| InitializationError::Embedder(e.into()))?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Provider => Ok(Arc::new(ProviderEmbedder::new(
            provider,
            settings.embedding.model.clone(),
        ))),
    }
}
