use std::fmt;

use prgate_core::{GateError, PullRequestDiff, ReviewIssue, Severity};
use serde::Deserialize;

const SYSTEM_PROMPT: &str = "\
You are a Senior Principal Engineer conducting a code review. You are \
direct, blunt, and pragmatic.

Your task is to review the PR diff and identify issues. For each issue, provide:
- file: The file path
- line: The line number where the issue occurs
- severity: BLOCK (must fix before merge), HIGH (should fix), or MEDIUM (nice to fix)
- category: Type of issue (Security, Architecture, Naming, Performance, Clean Code, etc.)
- message: A clear, memorable explanation of the issue
- fix: The specific action to fix the issue

IMPORTANT: Return your response as valid JSON in this exact format:
{
  \"issues\": [
    {
      \"file\": \"/path/to/file.cs\",
      \"line\": 42,
      \"severity\": \"HIGH\",
      \"category\": \"Naming\",
      \"message\": \"Explanation of the issue\",
      \"fix\": \"The actual fix they need\"
    }
  ],
  \"summary\": \"Review complete. BLOCK: X | HIGH: X | MEDIUM: X\"
}

If there are no issues, return:
{
  \"issues\": [],
  \"summary\": \"Ship it! Clean code detected.\"
}";

/// Placeholder summary used when the model omits one.
const FALLBACK_SUMMARY: &str = "Review complete.";

/// Pull request metadata subset rendered into the prompt.
#[derive(Debug, Clone)]
pub struct PrMetadata {
    /// Numeric pull request id.
    pub id: u64,
    /// Pull request title.
    pub title: String,
    /// Pull request description.
    pub description: String,
    /// Normalized source branch name.
    pub source_branch: String,
    /// Normalized target branch name.
    pub target_branch: String,
    /// Author display name.
    pub author: String,
}

/// One (path, unified diff) pair included in the prompt.
#[derive(Debug, Clone)]
pub struct DiffSection {
    /// Repository path of the file.
    pub path: String,
    /// Synthesized unified-diff text.
    pub diff: String,
}

/// Read-only input bundle handed to an LLM adapter.
///
/// # Examples
///
/// ```
/// use prgate_review::prompt::{PrMetadata, ReviewPrompt};
///
/// let prompt = ReviewPrompt {
///     pr: PrMetadata {
///         id: 1,
///         title: "t".into(),
///         description: String::new(),
///         source_branch: "feature".into(),
///         target_branch: "main".into(),
///         author: "Sam".into(),
///     },
///     diffs: Vec::new(),
///     rules: "Review carefully.".into(),
///     style_guide: None,
/// };
/// assert!(prompt.diffs.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ReviewPrompt {
    /// Metadata of the pull request under review.
    pub pr: PrMetadata,
    /// Ordered per-file diff sections.
    pub diffs: Vec<DiffSection>,
    /// Review rules text appended to the system instruction.
    pub rules: String,
    /// Optional style-guide excerpt, already truncated by the loader.
    pub style_guide: Option<String>,
}

impl ReviewPrompt {
    /// Build a prompt from an aggregated pull request diff.
    pub fn from_diff(
        diff: &PullRequestDiff,
        rules: String,
        style_guide: Option<String>,
    ) -> Self {
        Self {
            pr: PrMetadata {
                id: diff.pr.id,
                title: diff.pr.title.clone(),
                description: diff.pr.description.clone(),
                source_branch: diff.pr.source_branch.clone(),
                target_branch: diff.pr.target_branch.clone(),
                author: diff.pr.author_name.clone(),
            },
            diffs: diff
                .diffs
                .iter()
                .map(|d| DiffSection {
                    path: d.path.clone(),
                    diff: d.diff.clone(),
                })
                .collect(),
            rules,
            style_guide,
        }
    }
}

/// Result of one review run, produced by exactly one adapter invocation.
#[derive(Debug, Clone)]
pub struct ReviewResult {
    /// Issues in the order the model returned them.
    pub issues: Vec<ReviewIssue>,
    /// Free-text run summary.
    pub summary: String,
}

impl ReviewResult {
    /// Number of issues at the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Whether any issue blocks the merge.
    pub fn has_blockers(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Block)
    }
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            writeln!(f, "No issues found.")?;
        } else {
            for issue in &self.issues {
                writeln!(
                    f,
                    "[{}] {} ({}:{})",
                    issue.severity, issue.category, issue.file, issue.line
                )?;
                writeln!(f, "  {}", issue.message)?;
                writeln!(f, "  Fix: {}\n", issue.fix)?;
            }
        }
        writeln!(f, "Summary: {}", self.summary)
    }
}

/// Build the system instruction: reviewer persona + output-format
/// directive + the caller's rules text.
pub fn build_system_prompt(rules: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\n{rules}")
}

/// Render the user-visible prompt body: PR metadata block, one fenced
/// diff section per file, and the style-guide excerpt when present.
///
/// # Examples
///
/// ```
/// use prgate_review::prompt::{build_user_prompt, DiffSection, PrMetadata, ReviewPrompt};
///
/// let prompt = ReviewPrompt {
///     pr: PrMetadata {
///         id: 9,
///         title: "Harden auth".into(),
///         description: String::new(),
///         source_branch: "fix".into(),
///         target_branch: "main".into(),
///         author: "Kim".into(),
///     },
///     diffs: vec![DiffSection { path: "/a.cs".into(), diff: "+x".into() }],
///     rules: String::new(),
///     style_guide: None,
/// };
/// let body = build_user_prompt(&prompt);
/// assert!(body.contains("### /a.cs"));
/// assert!(body.contains("```diff"));
/// ```
pub fn build_user_prompt(prompt: &ReviewPrompt) -> String {
    use std::fmt::Write;

    let description = if prompt.pr.description.is_empty() {
        "No description"
    } else {
        &prompt.pr.description
    };

    let mut body = format!(
        "## PR Metadata\n\
         - ID: {}\n\
         - Title: {}\n\
         - Author: {}\n\
         - Source Branch: {}\n\
         - Target Branch: {}\n\
         - Description: {}\n\n\
         ## File Diffs\n",
        prompt.pr.id,
        prompt.pr.title,
        prompt.pr.author,
        prompt.pr.source_branch,
        prompt.pr.target_branch,
        description,
    );

    for section in &prompt.diffs {
        let _ = write!(
            body,
            "\n### {}\n```diff\n{}\n```\n",
            section.path, section.diff
        );
    }

    if let Some(guide) = &prompt.style_guide {
        let _ = write!(body, "\n## Clean Code Guidelines Reference\n{guide}\n");
    }

    body
}

#[derive(Deserialize)]
struct RawReview {
    #[serde(default)]
    issues: Vec<ReviewIssue>,
    summary: Option<String>,
}

/// Parse an LLM response into a [`ReviewResult`].
///
/// Locates the outermost JSON object in the text (models often wrap it
/// in prose or code fences), then deserializes it. Missing `issues`
/// defaults to an empty list and a missing `summary` to a fixed
/// placeholder; an unknown severity value is a parse failure, never
/// coerced.
///
/// # Errors
///
/// Returns [`GateError::Parse`] carrying the raw response text when no
/// JSON object can be located or deserialization fails.
pub fn parse_review_response(provider: &str, text: &str) -> Result<ReviewResult, GateError> {
    let json = extract_json_object(text).ok_or_else(|| GateError::Parse {
        provider: provider.to_string(),
        detail: "no JSON object found in response".into(),
        raw: text.to_string(),
    })?;

    let raw: RawReview = serde_json::from_str(json).map_err(|e| GateError::Parse {
        provider: provider.to_string(),
        detail: e.to_string(),
        raw: text.to_string(),
    })?;

    Ok(ReviewResult {
        issues: raw.issues,
        summary: raw.summary.unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt_with(diffs: Vec<DiffSection>, style_guide: Option<String>) -> ReviewPrompt {
        ReviewPrompt {
            pr: PrMetadata {
                id: 7,
                title: "Fix token refresh".into(),
                description: String::new(),
                source_branch: "fix/token".into(),
                target_branch: "main".into(),
                author: "Sam".into(),
            },
            diffs,
            rules: "No raw SQL.".into(),
            style_guide,
        }
    }

    #[test]
    fn system_prompt_appends_rules() {
        let system = build_system_prompt("No raw SQL.");
        assert!(system.contains("Senior Principal Engineer"));
        assert!(system.ends_with("No raw SQL."));
    }

    #[test]
    fn user_prompt_includes_metadata_and_diffs() {
        let prompt = prompt_with(
            vec![DiffSection {
                path: "/src/auth.cs".into(),
                diff: "-old\n+new".into(),
            }],
            None,
        );
        let body = build_user_prompt(&prompt);
        assert!(body.contains("- ID: 7"));
        assert!(body.contains("- Description: No description"));
        assert!(body.contains("### /src/auth.cs"));
        assert!(body.contains("```diff\n-old\n+new\n```"));
        assert!(!body.contains("Clean Code Guidelines"));
    }

    #[test]
    fn user_prompt_appends_style_guide_when_present() {
        let prompt = prompt_with(Vec::new(), Some("Prefer guard clauses.".into()));
        let body = build_user_prompt(&prompt);
        assert!(body.contains("## Clean Code Guidelines Reference"));
        assert!(body.contains("Prefer guard clauses."));
    }

    #[test]
    fn parse_valid_response() {
        let text = r#"{
            "issues": [
                {
                    "file": "/src/auth.cs",
                    "line": 42,
                    "severity": "BLOCK",
                    "category": "Security",
                    "message": "Token logged in plaintext",
                    "fix": "Redact before logging"
                }
            ],
            "summary": "Review complete. BLOCK: 1 | HIGH: 0 | MEDIUM: 0"
        }"#;
        let result = parse_review_response("claude", text).unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Block);
        assert!(result.summary.contains("BLOCK: 1"));
    }

    #[test]
    fn parse_json_wrapped_in_prose_and_fences() {
        let text = "Here is my review:\n```json\n{\"issues\": [], \"summary\": \"Ship it!\"}\n```\nDone.";
        let result = parse_review_response("claude", text).unwrap();
        assert!(result.issues.is_empty());
        assert_eq!(result.summary, "Ship it!");
    }

    #[test]
    fn missing_issues_and_summary_get_defaults() {
        let result = parse_review_response("openai", "{}").unwrap();
        assert!(result.issues.is_empty());
        assert_eq!(result.summary, "Review complete.");
    }

    #[test]
    fn response_without_json_is_a_parse_error() {
        let err = parse_review_response("claude", "I cannot review this diff.").unwrap_err();
        match err {
            GateError::Parse { provider, raw, .. } => {
                assert_eq!(provider, "claude");
                assert_eq!(raw, "I cannot review this diff.");
            }
            other => panic!("expected Parse error, got {other}"),
        }
    }

    #[test]
    fn unknown_severity_is_a_parse_error_not_coerced() {
        let text = r#"{
            "issues": [
                {"file": "/a.cs", "line": 1, "severity": "CRITICAL",
                 "category": "Bug", "message": "m", "fix": "f"}
            ],
            "summary": "s"
        }"#;
        let err = parse_review_response("openai", text).unwrap_err();
        assert!(matches!(err, GateError::Parse { .. }));
    }

    #[test]
    fn severity_counts() {
        let result = parse_review_response(
            "openai",
            r#"{"issues": [
                {"file": "/a.cs", "line": 1, "severity": "BLOCK", "category": "c", "message": "m", "fix": "f"},
                {"file": "/b.cs", "line": 2, "severity": "MEDIUM", "category": "c", "message": "m", "fix": "f"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(result.count(Severity::Block), 1);
        assert_eq!(result.count(Severity::High), 0);
        assert_eq!(result.count(Severity::Medium), 1);
        assert!(result.has_blockers());
    }

    #[test]
    fn display_renders_issues_and_summary() {
        let result = parse_review_response(
            "claude",
            r#"{"issues": [
                {"file": "/a.cs", "line": 3, "severity": "HIGH", "category": "Naming", "message": "vague name", "fix": "rename it"}
            ], "summary": "one issue"}"#,
        )
        .unwrap();
        let text = format!("{result}");
        assert!(text.contains("[HIGH] Naming (/a.cs:3)"));
        assert!(text.contains("Fix: rename it"));
        assert!(text.contains("Summary: one issue"));
    }
}
