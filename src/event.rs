use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::PrTarget;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("GITHUB_EVENT_PATH not found. Provide path or run from GitHub Actions.")]
    MissingPath,

    #[error("Failed to read event file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse event payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cannot determine repo from event payload")]
    MissingRepository,

    #[error("Invalid repository full name: {0}")]
    InvalidRepository(String),

    #[error("This script expects a pull_request event")]
    MissingPullRequest,
}

/// The subset of a GitHub webhook payload this tool reads.
#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    repository: Option<Repository>,
    pull_request: Option<PullRequestRef>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    number: u64,
}

/// Load the triggering event from `path` and extract the PR it refers to.
#[instrument(skip_all)]
pub fn load_event(path: Option<&Path>) -> Result<PrTarget, EventError> {
    let path = path.ok_or(EventError::MissingPath)?;
    if !path.exists() {
        return Err(EventError::MissingPath);
    }

    debug!(path = %path.display(), "reading event payload");
    let contents = fs::read_to_string(path).map_err(|source| EventError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_event(&contents)
}

/// Extract the PR target from a raw event payload.
pub fn parse_event(payload: &str) -> Result<PrTarget, EventError> {
    let event: PullRequestEvent = serde_json::from_str(payload)?;

    let full_name = event
        .repository
        .and_then(|r| r.full_name)
        .filter(|name| !name.is_empty())
        .ok_or(EventError::MissingRepository)?;

    let (owner, repo) = match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            (owner.to_string(), repo.to_string())
        }
        _ => return Err(EventError::InvalidRepository(full_name.clone())),
    };

    let number = event
        .pull_request
        .ok_or(EventError::MissingPullRequest)?
        .number;

    Ok(PrTarget {
        owner,
        repo,
        number,
    })
}
