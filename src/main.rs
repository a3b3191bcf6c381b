mod config;
mod event;
mod pr;
mod prompt;
mod provider;
mod report;

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::pr::GitHubClient;

/// LlamaPReview — reviews a GitHub Pull Request with an LLM provider and
/// posts the review back to the PR as a comment.
#[derive(Parser, Debug)]
#[command(name = "llamapreview", version, about)]
struct Cli {
    /// Path to the pull_request event payload (JSON).
    ///
    /// Defaults to GITHUB_EVENT_PATH, which GitHub Actions sets.
    event_path: Option<PathBuf>,

    /// Optional TOML config file (defaults to .llamapreview.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => run(&config, cli.event_path.as_deref()).await,
        Err(err) => Err(err.into()),
    };

    if let Err(err) = result {
        report::print_error(&*err);
        std::process::exit(1);
    }
}

/// One review: resolve provider, load event, fetch files, prompt, post.
///
/// Everything that can fail without touching the network is checked before
/// the first request goes out.
async fn run(config: &Config, event_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    info!("resolving credentials and provider");
    let token = config.github_token()?;
    let http = build_http_client(config)?;

    let provider = provider::from_config(config, http.clone())?;
    report::print_provider(provider.kind());

    let target = event::load_event(event_path.or(config.event_path.as_deref()))?;
    let span = info_span!("review", repo = %target.full_name(), pr = target.number, provider = %provider.kind());

    async {
        let github = GitHubClient::new(http, config.github_api_url(), token);

        info!("fetching changed files from GitHub");
        let files = github.list_pr_files(&target).await?;
        info!(files = files.len(), "fetched changed files");

        let summaries = prompt::summarize_changed_files(
            &files,
            config.review.file_limit,
            config.review.chars_per_patch,
        );
        let prompt = prompt::generate_prompt(&target.full_name(), target.number, &summaries);
        debug!(blocks = summaries.len(), prompt_bytes = prompt.len(), "built prompt");

        info!("requesting review from provider");
        let review = provider.generate(&prompt).await?;
        debug!(review_bytes = review.len(), "received review");

        let body = report::compose_comment(provider.kind(), &review);
        info!("posting review comment");
        github.post_comment(&target, &body).await?;

        report::print_posted();
        Ok::<(), Box<dyn Error>>(())
    }
    .instrument(span)
    .await
}

/// Shared HTTP client; its timeout bounds every request of the run.
fn build_http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("llamapreview/", env!("CARGO_PKG_VERSION")))
        .timeout(config.http_timeout())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::provider::ProviderError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{any, body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILES_PATH: &str = "/repos/acme/trader/pulls/42/files";
    const COMMENTS_PATH: &str = "/repos/acme/trader/issues/42/comments";

    fn event_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "action": "synchronize",
                "repository": {"full_name": "acme/trader"},
                "pull_request": {"number": 42},
            })
        )
        .unwrap();
        file
    }

    fn config_for(server: &MockServer, vars: &[(&str, &str)]) -> Config {
        let mut env: HashMap<String, String> = HashMap::from([
            ("GITHUB_TOKEN".to_string(), "ghp_test".to_string()),
            ("GITHUB_API_URL".to_string(), server.uri()),
            ("OPENAI_API_URL".to_string(), format!("{}/v1", server.uri())),
            ("HF_API_URL".to_string(), server.uri()),
        ]);
        for (k, v) in vars {
            env.insert(k.to_string(), v.to_string());
        }

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).cloned());
        config
    }

    async fn mount_files(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(FILES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"filename": "lib/actions/finnhub.actions.ts", "patch": "@@ -1 +1 @@\n-old\n+new"},
                {"filename": "public/logo.png"},
            ])))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_cli_event_path_is_optional() {
        let cli = Cli::parse_from(["llamapreview"]);
        assert!(cli.event_path.is_none());

        let cli = Cli::parse_from(["llamapreview", "event.json", "--config", "review.toml"]);
        assert_eq!(cli.event_path, Some(PathBuf::from("event.json")));
        assert_eq!(cli.config, Some(PathBuf::from("review.toml")));
    }

    #[tokio::test]
    async fn test_openai_review_is_posted() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .and(body_string_contains("FILE: lib/actions/finnhub.actions.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "### Summary\nPrice feed swap."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .and(body_string_contains("Model provider:** openai"))
            .and(body_string_contains("Price feed swap."))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(
            &server,
            &[("MODEL_PROVIDER", "OpenAI"), ("OPENAI_API_KEY", "sk-test")],
        );
        run(&config, Some(event.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_openai_model_override() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4.1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(
            &server,
            &[
                ("MODEL_PROVIDER", "openai"),
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", "gpt-4.1"),
            ],
        );
        run(&config, Some(event.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_huggingface_review_is_posted() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/models/tiiuae/falcon-7b-instruct"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"generated_text": "HF review"}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .and(body_string_contains("Model provider:** huggingface"))
            .and(body_string_contains("HF review"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("MODEL_PROVIDER", "huggingface"), ("HF_TOKEN", "hf")]);
        run(&config, Some(event.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_event_path_from_environment() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/models/tiiuae/falcon-7b-instruct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"generated_text": "x"}])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let event = event_file();
        let event_path = event.path().display().to_string();
        let config = config_for(
            &server,
            &[
                ("MODEL_PROVIDER", "huggingface"),
                ("HF_TOKEN", "hf"),
                ("GITHUB_EVENT_PATH", event_path.as_str()),
            ],
        );
        run(&config, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_provider_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("MODEL_PROVIDER", "claude")]);
        let err = run(&config, Some(event.path())).await.unwrap_err();
        let err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(matches!(err, ProviderError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn test_missing_github_token_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let event = event_file();
        let mut config = config_for(&server, &[("MODEL_PROVIDER", "openai"), ("OPENAI_API_KEY", "sk")]);
        config.github.token = None;
        let err = run(&config, Some(event.path())).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::MissingToken)));
        assert_eq!(report::error_message(&*err), "GITHUB_TOKEN is required in environment");
    }

    #[tokio::test]
    async fn test_missing_provider_credential_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("MODEL_PROVIDER", "openai")]);
        let err = run(&config, Some(event.path())).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MissingCredential { var: "OPENAI_API_KEY", .. })
        ));
    }

    #[tokio::test]
    async fn test_perplexity_fails_without_posting() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("PERPLEXITY_API_KEY", "pplx")]);
        let err = run(&config, Some(event.path())).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::NotImplemented(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_posts_nothing() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("MODEL_PROVIDER", "openai"), ("OPENAI_API_KEY", "sk")]);
        let err = run(&config, Some(event.path())).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ProviderError>(), Some(ProviderError::Http(_))));
    }

    #[tokio::test]
    async fn test_comment_failure_is_reported() {
        let server = MockServer::start().await;
        mount_files(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let event = event_file();
        let config = config_for(&server, &[("MODEL_PROVIDER", "openai"), ("OPENAI_API_KEY", "sk")]);
        let err = run(&config, Some(event.path())).await.unwrap_err();
        assert!(err.downcast_ref::<pr::PrError>().is_some());
    }
}
