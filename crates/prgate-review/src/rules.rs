//! Loading of review rules and the optional style guide.

use std::path::Path;

/// Fallback instruction used when no rules file is configured or the
/// configured file is missing.
pub const DEFAULT_RULES: &str =
    "Review for code quality, security issues, and best practices.";

/// Maximum number of characters of style-guide text included in the
/// prompt. Longer guides are truncated, not rejected.
pub const STYLE_GUIDE_CAP: usize = 20_000;

/// Load the review rules text.
///
/// A missing path or unreadable file yields [`DEFAULT_RULES`]; rules are
/// advisory input to the prompt, so their absence is never fatal.
///
/// # Examples
///
/// ```
/// use prgate_review::rules::{load_rules, DEFAULT_RULES};
///
/// assert_eq!(load_rules(None), DEFAULT_RULES);
/// ```
pub fn load_rules(path: Option<&Path>) -> String {
    path.and_then(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_else(|| DEFAULT_RULES.to_string())
}

/// Load the optional clean-code style guide, truncated to
/// [`STYLE_GUIDE_CAP`] characters to bound prompt size.
///
/// Returns `None` when no path is configured or the file is unreadable.
pub fn load_style_guide(path: Option<&Path>) -> Option<String> {
    let content = std::fs::read_to_string(path?).ok()?;
    if content.chars().count() > STYLE_GUIDE_CAP {
        Some(content.chars().take(STYLE_GUIDE_CAP).collect())
    } else {
        Some(content)
    }
}
