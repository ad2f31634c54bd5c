use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a pull request, fetched once per review run.
///
/// Branch names are normalized: the `refs/heads/` prefix is stripped.
/// Optional upstream fields default to empty strings rather than failing
/// the fetch.
///
/// # Examples
///
/// ```
/// use prgate_core::PullRequestInfo;
/// use chrono::Utc;
///
/// let pr = PullRequestInfo {
///     id: 42,
///     title: "Add retry logic".into(),
///     description: String::new(),
///     source_branch: "feature/retry".into(),
///     target_branch: "main".into(),
///     author_name: "Dana".into(),
///     author_email: "dana@example.com".into(),
///     created: Utc::now(),
///     status: "active".into(),
///     repository_id: "repo-1".into(),
///     project_name: "Platform".into(),
/// };
/// assert_eq!(pr.target_branch, "main");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    /// Numeric pull request id.
    pub id: u64,
    /// Pull request title.
    pub title: String,
    /// Pull request description, empty when the author left none.
    pub description: String,
    /// Source branch name without the `refs/heads/` prefix.
    pub source_branch: String,
    /// Target branch name without the `refs/heads/` prefix.
    pub target_branch: String,
    /// Display name of the author.
    pub author_name: String,
    /// Contact address of the author.
    pub author_email: String,
    /// Creation timestamp; defaults to fetch time when the service
    /// omits it.
    pub created: DateTime<Utc>,
    /// Status string as reported by the service.
    pub status: String,
    /// Id of the owning repository.
    pub repository_id: String,
    /// Name of the owning project.
    pub project_name: String,
}

/// Kind of change applied to a file in a pull request iteration.
///
/// # Examples
///
/// ```
/// use prgate_core::ChangeKind;
///
/// assert_eq!(ChangeKind::from_code(1), ChangeKind::Add);
/// assert_eq!(ChangeKind::from_code(99), ChangeKind::Edit);
/// assert_eq!(ChangeKind::Delete.to_string(), "delete");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// New file added.
    Add,
    /// Existing file modified in place.
    Edit,
    /// Existing file removed.
    Delete,
    /// File moved to a new path.
    Rename,
}

impl ChangeKind {
    /// Map the service's integer change-type code to a [`ChangeKind`].
    ///
    /// Codes: 1 = add, 2 = edit, 16 = delete, 8 = rename. Any
    /// unrecognized code maps to [`ChangeKind::Edit`].
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ChangeKind::Add,
            2 => ChangeKind::Edit,
            16 => ChangeKind::Delete,
            8 => ChangeKind::Rename,
            _ => ChangeKind::Edit,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Edit => write!(f, "edit"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::Rename => write!(f, "rename"),
        }
    }
}

/// A single changed file in a pull request iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Path of the file within the repository.
    pub path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Prior path, set only for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
}

/// A synthesized unified diff for one changed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// Path of the file within the repository.
    pub path: String,
    /// Unified-diff text for the file.
    pub diff: String,
    /// Prior path, set only for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
}

/// Aggregate diff view of a pull request, the unit passed whole into the
/// review pipeline.
///
/// `files` and `diffs` come from two independently fetched views of the
/// changed-file list (full history vs. latest iteration); they may differ
/// in completeness and are deliberately not reconciled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestDiff {
    /// Pull request metadata snapshot.
    pub pr: PullRequestInfo,
    /// Changed files, full history view.
    pub files: Vec<FileChange>,
    /// Synthesized per-file diffs, latest-iteration view.
    pub diffs: Vec<FileDiff>,
}

/// Review-issue priority tier used to decide merge gating.
///
/// Ordered by blocking priority: Block > High > Medium. An unrecognized
/// severity string from an LLM response is a parse failure, never
/// silently coerced.
///
/// # Examples
///
/// ```
/// use prgate_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"BLOCK\"").unwrap();
/// assert_eq!(s, Severity::Block);
/// assert!(serde_json::from_str::<Severity>("\"critical\"").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Must be fixed before merge.
    Block,
    /// Should be fixed.
    High,
    /// Nice to fix.
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Block => write!(f, "BLOCK"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BLOCK" => Ok(Severity::Block),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl Severity {
    /// Returns `true` if `self` is at least as severe as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prgate_core::Severity;
    ///
    /// assert!(Severity::Block.meets_threshold(Severity::High));
    /// assert!(Severity::High.meets_threshold(Severity::High));
    /// assert!(!Severity::Medium.meets_threshold(Severity::High));
    /// ```
    pub fn meets_threshold(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Severity::Block => 0,
            Severity::High => 1,
            Severity::Medium => 2,
        }
    }
}

/// A single issue found by the reviewer; one issue becomes one candidate
/// inline comment.
///
/// # Examples
///
/// ```
/// use prgate_core::{ReviewIssue, Severity};
///
/// let issue = ReviewIssue {
///     file: "/src/auth.cs".into(),
///     line: 42,
///     severity: Severity::High,
///     category: "Security".into(),
///     message: "Token is logged in plaintext".into(),
///     fix: "Redact the token before logging".into(),
/// };
/// assert_eq!(issue.severity, Severity::High);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIssue {
    /// Path of the file the issue refers to.
    pub file: String,
    /// 1-based line number in the new version of the file.
    pub line: u32,
    /// Merge-blocking priority of the issue.
    pub severity: Severity,
    /// Free-text issue category (Security, Naming, Performance, ...).
    pub category: String,
    /// Human-readable explanation of the issue.
    pub message: String,
    /// Specific remediation for the issue.
    pub fix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_from_code_known_values() {
        assert_eq!(ChangeKind::from_code(1), ChangeKind::Add);
        assert_eq!(ChangeKind::from_code(2), ChangeKind::Edit);
        assert_eq!(ChangeKind::from_code(16), ChangeKind::Delete);
        assert_eq!(ChangeKind::from_code(8), ChangeKind::Rename);
    }

    #[test]
    fn change_kind_unknown_codes_default_to_edit() {
        assert_eq!(ChangeKind::from_code(0), ChangeKind::Edit);
        assert_eq!(ChangeKind::from_code(3), ChangeKind::Edit);
        assert_eq!(ChangeKind::from_code(99), ChangeKind::Edit);
    }

    #[test]
    fn severity_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Block).unwrap(), "\"BLOCK\"");
        let parsed: Severity = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(parsed, Severity::Medium);
    }

    #[test]
    fn severity_rejects_unknown_values() {
        assert!(serde_json::from_str::<Severity>("\"LOW\"").is_err());
        assert!("nit".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_from_str_is_case_insensitive() {
        assert_eq!("block".parse::<Severity>().unwrap(), Severity::Block);
        assert_eq!("High".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("MEDIUM".parse::<Severity>().unwrap(), Severity::Medium);
    }

    #[test]
    fn severity_ordering_block_first() {
        assert!(Severity::Block.meets_threshold(Severity::Block));
        assert!(Severity::Block.meets_threshold(Severity::Medium));
        assert!(!Severity::High.meets_threshold(Severity::Block));
        assert!(!Severity::Medium.meets_threshold(Severity::High));
    }

    #[test]
    fn review_issue_serializes_camel_case() {
        let issue = ReviewIssue {
            file: "a.rs".into(),
            line: 1,
            severity: Severity::Medium,
            category: "Naming".into(),
            message: "m".into(),
            fix: "f".into(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "MEDIUM");
        assert!(json.get("file").is_some());
    }

    #[test]
    fn pull_request_diff_keeps_both_views() {
        let pr = PullRequestInfo {
            id: 1,
            title: "t".into(),
            description: String::new(),
            source_branch: "feature".into(),
            target_branch: "main".into(),
            author_name: String::new(),
            author_email: String::new(),
            created: Utc::now(),
            status: "active".into(),
            repository_id: "r".into(),
            project_name: "p".into(),
        };
        let agg = PullRequestDiff {
            pr,
            files: vec![FileChange {
                path: "/a.cs".into(),
                kind: ChangeKind::Edit,
                original_path: None,
            }],
            diffs: Vec::new(),
        };
        // The two views are independent; an empty diff list does not
        // imply an empty change list.
        assert_eq!(agg.files.len(), 1);
        assert!(agg.diffs.is_empty());
    }
}
