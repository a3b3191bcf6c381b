pub mod types;

pub use types::{ChangedFile, PrTarget};

use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument};

/// GitHub's maximum page size for the PR files endpoint.
pub const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),
}

/// Thin client over the two GitHub REST endpoints a review run touches.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch every changed file of the pull request, in API order.
    ///
    /// Pages of `PER_PAGE` entries are requested until a short (or empty)
    /// page comes back. Any non-2xx status aborts the listing.
    #[instrument(skip(self), fields(owner = %target.owner, repo = %target.repo, pr = target.number))]
    pub async fn list_pr_files(&self, target: &PrTarget) -> Result<Vec<ChangedFile>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, target.owner, target.repo, target.number
        );

        let mut files = Vec::new();
        let mut page = 1usize;
        loop {
            debug!(page, "fetching changed files page");
            let batch = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<ChangedFile>>()
                .await?;

            let count = batch.len();
            debug!(page, count, "received changed files page");
            files.extend(batch);

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Post `body` as a comment on the pull request's conversation.
    #[instrument(skip(self, body), fields(owner = %target.owner, repo = %target.repo, pr = target.number))]
    pub async fn post_comment(&self, target: &PrTarget, body: &str) -> Result<(), PrError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, target.owner, target.repo, target.number
        );

        debug!(body_bytes = body.len(), "posting PR comment");
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
