use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".llamapreview.toml";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PROVIDER: &str = "perplexity";
pub const DEFAULT_HF_MODEL: &str = "tiiuae/falcon-7b-instruct";
pub const DEFAULT_HF_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GITHUB_TOKEN is required in environment")]
    MissingToken,
}

/// Everything the run needs from the outside world, collected once at startup.
///
/// Values come from an optional TOML file and are then overridden by the
/// environment. All fields are optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub huggingface: HuggingFaceConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub perplexity: PerplexityConfig,

    #[serde(default)]
    pub review: ReviewConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Event payload path from GITHUB_EVENT_PATH. Never read from the file.
    #[serde(skip)]
    pub event_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token (GITHUB_TOKEN)
    pub token: Option<String>,
    /// REST API base URL (GITHUB_API_URL)
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (MODEL_PROVIDER), matched case-insensitively
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HuggingFaceConfig {
    pub token: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerplexityConfig {
    pub api_key: Option<String>,
}

/// Bounds applied by the prompt builder.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    /// Maximum number of changed files included in the prompt
    #[serde(default = "default_file_limit")]
    pub file_limit: usize,
    /// Patch length (in characters) after which a patch is truncated
    #[serde(default = "default_chars_per_patch")]
    pub chars_per_patch: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            file_limit: default_file_limit(),
            chars_per_patch: default_chars_per_patch(),
        }
    }
}

fn default_file_limit() -> usize {
    8
}

fn default_chars_per_patch() -> usize {
    1500
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every HTTP call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration for this run.
    ///
    /// An explicit `path` must exist. Without one, `.llamapreview.toml` in the
    /// current directory is used when present, otherwise defaults. The process
    /// environment is applied on top either way.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Override fields with environment values. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        override_with(&mut self.github.token, get("GITHUB_TOKEN"));
        override_with(&mut self.github.api_url, get("GITHUB_API_URL"));
        override_with(&mut self.provider.name, get("MODEL_PROVIDER"));
        override_with(&mut self.perplexity.api_key, get("PERPLEXITY_API_KEY"));
        override_with(&mut self.huggingface.token, get("HF_TOKEN"));
        override_with(&mut self.huggingface.model, get("HF_MODEL"));
        override_with(&mut self.huggingface.api_url, get("HF_API_URL"));
        override_with(&mut self.openai.api_key, get("OPENAI_API_KEY"));
        override_with(&mut self.openai.model, get("OPENAI_MODEL"));
        override_with(&mut self.openai.api_url, get("OPENAI_API_URL"));

        if let Some(path) = get("GITHUB_EVENT_PATH") {
            self.event_path = Some(PathBuf::from(path));
        }
    }

    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn github_api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn hf_model(&self) -> &str {
        self.huggingface.model.as_deref().unwrap_or(DEFAULT_HF_MODEL)
    }

    pub fn hf_api_url(&self) -> &str {
        self.huggingface.api_url.as_deref().unwrap_or(DEFAULT_HF_API_URL)
    }

    pub fn openai_model(&self) -> &str {
        self.openai.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    pub fn openai_api_url(&self) -> &str {
        self.openai.api_url.as_deref().unwrap_or(DEFAULT_OPENAI_API_URL)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

fn override_with(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}
