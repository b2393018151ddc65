//! Typed view over the loaded YAML config.
//!
//! Every field falls back to the values in [`super::defaults`], so an empty
//! config file produces a working local setup (Ollama on its default port,
//! hash embeddings, 1000/200 chunking).

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::defaults::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    LmStudio,
}

impl ProviderKind {
    fn parse(raw: &str) -> Self {
        match raw {
            "lmstudio" => ProviderKind::LmStudio,
            _ => ProviderKind::Ollama,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Ollama => DEFAULT_OLLAMA_URL,
            ProviderKind::LmStudio => DEFAULT_LMSTUDIO_URL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Hash,
    Provider,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub health_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub history_window: usize,
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub scraper: ScraperSettings,
}

impl AppSettings {
    pub fn from_config(config: &Value) -> Self {
        let server = config.get("server");
        let llm = config.get("llm");
        let embedding = config.get("embedding");
        let rag = config.get("rag");
        let scraper = config.get("scraper");

        let provider = ProviderKind::parse(&string_field(llm, "provider", DEFAULT_PROVIDER));
        let base_url = string_field(llm, "base_url", provider.default_base_url())
            .trim_end_matches('/')
            .to_string();

        let cors_allowed_origins = server
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(default_local_origins);

        AppSettings {
            server: ServerSettings {
                host: string_field(server, "host", DEFAULT_HOST),
                port: u64_field(server, "port", 0) as u16,
                cors_allowed_origins,
            },
            llm: LlmSettings {
                provider,
                base_url,
                model: llm
                    .and_then(|v| v.get("model"))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                temperature: f64_field(llm, "temperature", DEFAULT_TEMPERATURE),
                top_p: f64_field(llm, "top_p", DEFAULT_TOP_P),
                max_output_tokens: u64_field(
                    llm,
                    "max_output_tokens",
                    DEFAULT_MAX_OUTPUT_TOKENS as u64,
                ) as u32,
                timeout: Duration::from_secs(u64_field(
                    llm,
                    "timeout_secs",
                    DEFAULT_GENERATION_TIMEOUT_SECS,
                )),
                health_timeout: Duration::from_secs(u64_field(
                    llm,
                    "health_timeout_secs",
                    DEFAULT_HEALTH_TIMEOUT_SECS,
                )),
            },
            embedding: EmbeddingSettings {
                backend: match string_field(embedding, "backend", DEFAULT_EMBEDDING_BACKEND)
                    .as_str()
                {
                    "provider" => EmbeddingBackend::Provider,
                    _ => EmbeddingBackend::Hash,
                },
                model: string_field(embedding, "model", DEFAULT_EMBEDDING_MODEL),
                dimension: u64_field(
                    embedding,
                    "dimension",
                    DEFAULT_EMBEDDING_DIMENSION as u64,
                ) as usize,
            },
            rag: RagSettings {
                chunk_size: u64_field(rag, "chunk_size", DEFAULT_CHUNK_SIZE as u64) as usize,
                chunk_overlap: u64_field(rag, "chunk_overlap", DEFAULT_CHUNK_OVERLAP as u64)
                    as usize,
                top_k: u64_field(rag, "top_k", DEFAULT_TOP_K as u64) as usize,
                history_window: u64_field(rag, "history_window", DEFAULT_HISTORY_WINDOW as u64)
                    as usize,
            },
            scraper: ScraperSettings {
                timeout: Duration::from_secs(u64_field(
                    scraper,
                    "timeout_secs",
                    DEFAULT_SCRAPER_TIMEOUT_SECS,
                )),
                user_agent: string_field(scraper, "user_agent", DEFAULT_USER_AGENT),
            },
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&Value::Null)
    }
}

fn string_field(section: Option<&Value>, key: &str, default: &str) -> String {
    section
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn u64_field(section: Option<&Value>, key: &str, default: u64) -> u64 {
    section
        .and_then(|v| v.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(default)
}

fn f64_field(section: Option<&Value>, key: &str, default: f64) -> f64 {
    section
        .and_then(|v| v.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(default)
}
