//! Turns the changed files of a PR into the review prompt sent to a provider.

use crate::pr::ChangedFile;

/// Appended to a patch that was cut at the character cap.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

const INSTRUCTIONS: &str = "Produce:\n\
1) A concise summary of the changes (3-5 sentences).\n\
2) Security, correctness, and data-quality risks specific to finance/market data.\n\
3) Suggested tests and monitoring to add.\n\
4) Small code suggestions or examples for any clear issues.\n\n\
Be concise and use bullet-style output, labeled sections.\n\n";

const NO_PATCHES: &str = "(no file patches available)";

/// Format at most `limit` files as `FILE:` blocks, cutting each patch to
/// `chars_per_patch` characters.
pub fn summarize_changed_files(
    files: &[ChangedFile],
    limit: usize,
    chars_per_patch: usize,
) -> Vec<String> {
    files
        .iter()
        .take(limit)
        .map(|file| {
            let patch = truncate_patch(file.patch_text(), chars_per_patch);
            format!("FILE: {}\n---\n{}\n", file.filename, patch)
        })
        .collect()
}

/// Cut `patch` to `cap` characters and mark it, or return it whole.
///
/// Counts chars rather than bytes so multi-byte text is never split.
fn truncate_patch(patch: &str, cap: usize) -> String {
    match patch.char_indices().nth(cap) {
        Some((end, _)) => format!("{}{}", &patch[..end], TRUNCATION_MARKER),
        None => patch.to_string(),
    }
}

/// Assemble the full prompt: preamble, review instructions, then the file blocks.
pub fn generate_prompt(repo_full: &str, pr_number: u64, file_summaries: &[String]) -> String {
    let header = format!(
        "You are LlamaPReview — give a focused code review for a stock-market app.\n\
         Repository: {repo_full}\n\
         PR: {pr_number}\n\n"
    );
    let files_text = if file_summaries.is_empty() {
        NO_PATCHES.to_string()
    } else {
        file_summaries.join("\n---\n")
    };

    format!("{header}{INSTRUCTIONS}\nFiles (truncated):\n{files_text}")
}
