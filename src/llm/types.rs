use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::LlmSettings;
use crate::core::errors::RagError;

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling parameters applied to every generation call of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl From<&LlmSettings> for GenerationParams {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderModel {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Pulls the generated text out of a completion payload. A missing or
/// non-string field is a backend error; a present but blank string is not.
pub(crate) fn reply_text(payload: &Value, field: &Value) -> Result<String, RagError> {
    if let Some(text) = field.as_str() {
        return Ok(text.to_string());
    }

    let reason = match &payload["error"] {
        Value::String(message) => message.clone(),
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload["error"].to_string()),
        _ => format!("response carried no generated text: {}", payload),
    };
    Err(RagError::BackendUnreachable(reason))
}
