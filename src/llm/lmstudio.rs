use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{reply_text, GenerationParams, ProviderModel, DEFAULT_REQUEST_TIMEOUT};
use crate::core::errors::RagError;

/// OpenAI-compatible local server (LM Studio).
#[derive(Clone)]
pub struct LmStudioProvider {
    base_url: String,
    client: Client,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl LmStudioProvider {
    pub fn new(base_url: impl Into<String>, health_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            health_timeout,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Deserialize)]
struct OpenAiModelsResponse {
    #[serde(default)]
    data: Vec<OpenAiModelInfo>,
}

#[derive(Deserialize)]
struct OpenAiModelInfo {
    id: String,
}

fn unreachable(err: reqwest::Error) -> RagError {
    RagError::BackendUnreachable(err.to_string())
}

#[async_trait]
impl LlmProvider for LmStudioProvider {
    fn name(&self) -> &str {
        "lmstudio"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let url = format!("{}/v1/models", self.base_url);
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
        let url = format!("{}/v1/models", self.base_url);
        let res = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(unreachable)?;

        if !res.status().is_success() {
            return Err(RagError::BackendUnreachable(format!(
                "Failed to list models: {}",
                res.status()
            )));
        }

        let response: OpenAiModelsResponse = res.json().await.map_err(unreachable)?;

        Ok(response
            .data
            .into_iter()
            .map(|m| ProviderModel {
                id: m.id.clone(),
                name: m.id,
                size: None,
            })
            .collect())
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        model_id: &str,
    ) -> Result<String, RagError> {
        let url = format!("{}/v1/completions", self.base_url);

        let body = json!({
            "model": model_id,
            "prompt": prompt,
            "stream": false,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_tokens": params.max_output_tokens,
        });

        let res = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(unreachable)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::BackendUnreachable(format!(
                "LM Studio completion error: {}",
                text
            )));
        }

        let payload: Value = res.json().await.map_err(unreachable)?;

        reply_text(&payload, &payload["choices"][0]["text"])
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(unreachable)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::BackendUnreachable(format!(
                "LM Studio embed error: {}",
                text
            )));
        }

        let payload: Value = res.json().await.map_err(unreachable)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        Ok(embeddings)
    }
}
