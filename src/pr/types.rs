use serde::Deserialize;

/// The pull request a run operates on, derived from the event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrTarget {
    pub owner: String,
    pub repo: String,
    /// PR number (e.g., 42)
    pub number: u64,
}

impl PrTarget {
    /// `owner/repo`, as GitHub spells `repository.full_name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
///
/// GitHub omits `patch` for binary files and for diffs too large to inline.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    /// File path (e.g., "src/auth/config.rs")
    pub filename: String,
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// Patch text, empty when GitHub did not include one.
    pub fn patch_text(&self) -> &str {
        self.patch.as_deref().unwrap_or("")
    }
}
