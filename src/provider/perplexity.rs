use async_trait::async_trait;
use tracing::warn;

use super::{Provider, ProviderError, ProviderKind};

/// Placeholder for Perplexity, which has no generally available API to target.
///
/// The key is still required so a misconfigured workflow fails the same way
/// the real providers do; `generate` always errors.
pub struct PerplexityProvider {
    _api_key: String,
}

impl PerplexityProvider {
    pub fn new(api_key: &str) -> Self {
        Self {
            _api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Provider for PerplexityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Perplexity
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        warn!("perplexity provider selected but not implemented");
        Err(ProviderError::NotImplemented(
            "Perplexity API integration is not implemented. Add a provider implementation or use Hugging Face / OpenAI.",
        ))
    }
}
