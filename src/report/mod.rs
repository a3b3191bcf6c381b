use crate::provider::ProviderKind;
use colored::Colorize;
use std::error::Error;

const HEADING: &str = "## LlamaPReview — automated review";
const FOOTER: &str = "*This comment was created by an automated review workflow.*";

/// Build the markdown body of the PR comment from the provider's output.
///
/// ## LlamaPReview — automated review
///
/// **Model provider:** openai
///
/// {review text}
///
/// ---
/// *This comment was created by an automated review workflow.*
pub fn compose_comment(provider: ProviderKind, review: &str) -> String {
    let mut md = String::new();
    md.push_str(HEADING);
    md.push_str("\n\n");
    md.push_str(&format!("**Model provider:** {}\n\n", provider));
    md.push_str(review);
    md.push_str("\n\n---\n");
    md.push_str(FOOTER);
    md
}

/// Terminal line announcing which provider the run uses.
pub fn print_provider(provider: ProviderKind) {
    println!("Using provider: {}", provider.to_string().bold());
}

/// Terminal confirmation printed once the comment is posted.
pub fn print_posted() {
    println!("{}", "Posted review comment.".green().bold());
}

/// Message shown for an error that ends the run.
pub fn error_message(err: &dyn Error) -> String {
    err.to_string()
}

/// Print a fatal error to stderr.
pub fn print_error(err: &dyn Error) {
    eprintln!("{} {}", "error:".red().bold(), error_message(err));
}
