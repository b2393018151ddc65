use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize embedder: {0}")]
    Embedder(#[source] anyhow::Error),

    #[error("Failed to initialize profile scraper: {0}")]
    Scraper(#[source] anyhow::Error),

    #[error("Failed to initialize session: {0}")]
    Session(#[source] anyhow::Error),
}
