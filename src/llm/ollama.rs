use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{reply_text, GenerationParams, ProviderModel, DEFAULT_REQUEST_TIMEOUT};
use crate::core::errors::RagError;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, health_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            health_timeout,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Upper bound for generation and embedding requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, RagError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|err| RagError::BackendUnreachable(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::BackendUnreachable(format!(
                "Ollama {} returned {}: {}",
                path, status, text
            )));
        }

        res.json()
            .await
            .map_err(|err| RagError::BackendUnreachable(err.to_string()))
    }
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, RagError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|err| RagError::BackendUnreachable(err.to_string()))?;

        if !res.status().is_success() {
            return Err(RagError::BackendUnreachable(format!(
                "Failed to list models: {}",
                res.status()
            )));
        }

        let tags: OllamaTagsResponse = res
            .json()
            .await
            .map_err(|err| RagError::BackendUnreachable(err.to_string()))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ProviderModel {
                id: m.name.clone(),
                name: m.name,
                size: m.size,
            })
            .collect())
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        model_id: &str,
    ) -> Result<String, RagError> {
        let body = json!({
            "model": model_id,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "top_p": params.top_p,
                "num_predict": params.max_output_tokens,
            },
        });

        let payload = self.post_json("/api/generate", &body).await?;
        reply_text(&payload, &payload["response"])
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let payload = self.post_json("/api/embed", &body).await?;

        let mut embeddings = Vec::new();
        if let Some(rows) = payload["embeddings"].as_array() {
            for row in rows {
                if let Some(vals) = row.as_array() {
                    embeddings.push(
                        vals.iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect(),
                    );
                }
            }
        }

        Ok(embeddings)
    }
}
