pub mod huggingface;
pub mod openai;
pub mod perplexity;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Sampling settings shared by every implemented provider.
pub const MAX_NEW_TOKENS: u32 = 512;
pub const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{var} required for {provider} provider")]
    MissingCredential {
        provider: ProviderKind,
        var: &'static str,
    },

    #[error("{0}")]
    NotImplemented(&'static str),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned an error: {0}")]
    Api(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Which inference backend a run talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Perplexity,
    HuggingFace,
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Perplexity => write!(f, "perplexity"),
            ProviderKind::HuggingFace => write!(f, "huggingface"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        match name.as_str() {
            "perplexity" => Ok(ProviderKind::Perplexity),
            "huggingface" => Ok(ProviderKind::HuggingFace),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(ProviderError::UnknownProvider(name)),
        }
    }
}

/// A backend that turns a review prompt into review text.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Send the prompt and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Pick and construct the provider named in `config`.
///
/// Fails before any network traffic when the name is unknown or the selected
/// provider's credential is missing.
pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Box<dyn Provider>, ProviderError> {
    let kind: ProviderKind = config.provider_name().parse()?;
    debug!(provider = %kind, "selected provider");

    let provider: Box<dyn Provider> = match kind {
        ProviderKind::Perplexity => {
            let api_key = require(kind, "PERPLEXITY_API_KEY", config.perplexity.api_key.as_deref())?;
            Box::new(perplexity::PerplexityProvider::new(api_key))
        }
        ProviderKind::HuggingFace => {
            let token = require(kind, "HF_TOKEN", config.huggingface.token.as_deref())?;
            Box::new(huggingface::HuggingFaceProvider::new(
                http,
                config.hf_api_url(),
                config.hf_model(),
                token,
            ))
        }
        ProviderKind::OpenAi => {
            let api_key = require(kind, "OPENAI_API_KEY", config.openai.api_key.as_deref())?;
            Box::new(openai::OpenAiProvider::new(
                http,
                config.openai_api_url(),
                config.openai_model(),
                api_key,
            ))
        }
    };

    Ok(provider)
}

fn require<'a>(
    provider: ProviderKind,
    var: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ProviderError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ProviderError::MissingCredential { provider, var })
}
