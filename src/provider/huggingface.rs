use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{Provider, ProviderError, ProviderKind, MAX_NEW_TOKENS, TEMPERATURE};

/// Hugging Face Inference API text-generation backend.
pub struct HuggingFaceProvider {
    http: reqwest::Client,
    api_url: String,
    model: String,
    token: String,
}

impl HuggingFaceProvider {
    pub fn new(http: reqwest::Client, api_url: &str, model: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_bytes = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}", self.api_url, self.model);
        let payload = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "temperature": TEMPERATURE,
            },
        });

        debug!("sending prompt to Hugging Face");
        let out = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        extract_generated_text(out)
    }
}

/// Pull the generated text out of whichever shape the inference API returned.
///
/// Text-generation models answer with `[{"generated_text": ...}]`; other
/// tasks return different lists or objects, which are passed through as JSON.
fn extract_generated_text(out: Value) -> Result<String, ProviderError> {
    match out {
        Value::Array(items) => {
            let first = items
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::MalformedResponse("empty result list".to_string()))?;
            match first.get("generated_text").and_then(Value::as_str) {
                Some(text) if !text.is_empty() => Ok(text.to_string()),
                _ => Ok(value_to_text(first)),
            }
        }
        Value::Object(ref map) if map.get("error").is_some_and(is_truthy) => {
            Err(ProviderError::Api(value_to_text(map["error"].clone())))
        }
        other => Ok(value_to_text(other)),
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
