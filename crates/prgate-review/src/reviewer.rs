//! The review pipeline: fetch, analyze, post.

use prgate_ado::fetcher::PullRequestFetcher;
use prgate_ado::poster::{CommentPoster, InlineComment};
use prgate_ado::service::GitService;
use prgate_core::{GateError, ReviewIssue, RulesConfig};

use crate::llm::LlmAdapter;
use crate::prompt::{ReviewPrompt, ReviewResult};
use crate::rules;

/// Per-run options for a single review.
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Repository name or id the pull request lives in.
    pub repository_id: String,
    /// Numeric pull request id.
    pub pull_request_id: u64,
    /// When set, render the critique locally and post nothing.
    pub dry_run: bool,
}

/// Outcome of one review run.
#[derive(Debug, Clone)]
pub struct ReviewOutput {
    /// The parsed critique.
    pub result: ReviewResult,
    /// Number of inline comments successfully posted.
    pub posted_comments: usize,
    /// Whether the summary thread was posted.
    pub summary_posted: bool,
}

/// Orchestrates one review run end to end.
///
/// Fetching and analysis failures abort the run; posting failures do
/// not. Each comment post is attempted independently and a failure is
/// logged and counted, so one rejected thread never suppresses the
/// rest of the critique.
pub struct Reviewer<C> {
    git: C,
    llm: LlmAdapter,
    rules: RulesConfig,
}

impl<C: GitService> Reviewer<C> {
    /// Create a reviewer over a service handle and a configured backend.
    pub fn new(git: C, llm: LlmAdapter, rules: RulesConfig) -> Self {
        Self { git, llm, rules }
    }

    /// Run the full pipeline for one pull request.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Fetch`] when pull request data cannot be
    /// retrieved, [`GateError::Llm`] on backend transport failures, and
    /// [`GateError::Parse`] when the backend response holds no valid
    /// review. Posting failures are absorbed into the output counts.
    pub async fn review(&self, options: &ReviewOptions) -> Result<ReviewOutput, GateError> {
        eprintln!("Fetching PR #{}...", options.pull_request_id);
        let fetcher = PullRequestFetcher::new(&self.git);
        let diff = fetcher
            .fetch_full_diff(&options.repository_id, options.pull_request_id)
            .await?;
        eprintln!("Found {} changed files", diff.files.len());

        let rules_text = rules::load_rules(self.rules.path.as_deref());
        let style_guide = rules::load_style_guide(self.rules.style_guide.as_deref());
        let prompt = ReviewPrompt::from_diff(&diff, rules_text, style_guide);

        eprintln!("Analyzing with {}...", self.llm.provider());
        let result = self
            .llm
            .review(&prompt)
            .await
            .map_err(|e| annotate_provider(&self.llm, e))?;

        Ok(publish(&self.git, options, result).await)
    }
}

/// Prefix transport errors with the provider so failures from different
/// backends are distinguishable downstream. Parse errors already carry
/// their provider.
fn annotate_provider(llm: &LlmAdapter, err: GateError) -> GateError {
    match err {
        GateError::Llm(msg) => GateError::Llm(format!("{}: {msg}", llm.provider())),
        other => other,
    }
}

/// Render one issue as a markdown comment body.
pub fn format_comment(issue: &ReviewIssue) -> String {
    format!(
        "**[{}] {}**\n\n> {}\n\n**Fix:** {}",
        issue.severity, issue.category, issue.message, issue.fix
    )
}

/// Terminal step of the pipeline: either render the critique locally
/// (dry run) or post it comment by comment.
///
/// Posting is best effort. A failed inline post is logged and skipped;
/// the summary thread is still attempted afterwards.
async fn publish<C: GitService>(
    git: C,
    options: &ReviewOptions,
    result: ReviewResult,
) -> ReviewOutput {
    if options.dry_run {
        println!("\nDry run - would post these comments:\n");
        println!("{result}");
        return ReviewOutput {
            result,
            posted_comments: 0,
            summary_posted: false,
        };
    }

    let poster = CommentPoster::new(git);
    let mut posted_comments = 0;
    for issue in &result.issues {
        let comment = InlineComment {
            file_path: issue.file.clone(),
            line: issue.line,
            content: format_comment(issue),
        };
        match poster
            .post_inline(&options.repository_id, options.pull_request_id, &comment)
            .await
        {
            Ok(_) => posted_comments += 1,
            Err(e) => eprintln!(
                "warning: failed to post comment on {}:{}: {e}",
                issue.file, issue.line
            ),
        }
    }

    let summary_posted = match poster
        .post_summary(
            &options.repository_id,
            options.pull_request_id,
            &result.summary,
        )
        .await
    {
        Ok(_) => true,
        Err(e) => {
            eprintln!("warning: failed to post summary: {e}");
            false
        }
    };

    ReviewOutput {
        result,
        posted_comments,
        summary_posted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prgate_ado::service::{
        ChangeEntry, CommentThread, IterationRef, RemotePullRequest,
    };
    use prgate_core::Severity;
    use std::sync::Mutex;

    /// Posting fake that rejects threads anchored on configured paths.
    #[derive(Default)]
    struct FlakyGit {
        reject_paths: Vec<String>,
        reject_summary: bool,
        threads: Mutex<Vec<CommentThread>>,
    }

    impl GitService for FlakyGit {
        async fn pull_request(
            &self,
            _repository_id: &str,
            _pull_request_id: u64,
        ) -> Result<RemotePullRequest, GateError> {
            unimplemented!("publish tests never fetch")
        }

        async fn iterations(
            &self,
            _repository_id: &str,
            _pull_request_id: u64,
        ) -> Result<Vec<IterationRef>, GateError> {
            unimplemented!("publish tests never fetch")
        }

        async fn iteration_changes(
            &self,
            _repository_id: &str,
            _pull_request_id: u64,
            _iteration_id: u64,
        ) -> Result<Vec<ChangeEntry>, GateError> {
            unimplemented!("publish tests never fetch")
        }

        async fn blob_content(
            &self,
            _repository_id: &str,
            _object_id: &str,
        ) -> Result<String, GateError> {
            unimplemented!("publish tests never fetch")
        }

        async fn create_thread(
            &self,
            _repository_id: &str,
            _pull_request_id: u64,
            thread: &CommentThread,
        ) -> Result<u64, GateError> {
            if let Some(anchor) = &thread.anchor {
                if self.reject_paths.iter().any(|p| p == &anchor.file_path) {
                    return Err(GateError::Post("thread rejected".into()));
                }
            } else if self.reject_summary {
                return Err(GateError::Post("summary rejected".into()));
            }
            let mut threads = self.threads.lock().unwrap();
            threads.push(thread.clone());
            Ok(threads.len() as u64)
        }
    }

    fn issue(file: &str, severity: Severity) -> ReviewIssue {
        ReviewIssue {
            file: file.into(),
            line: 10,
            severity,
            category: "Security".into(),
            message: "token logged".into(),
            fix: "redact it".into(),
        }
    }

    fn options(dry_run: bool) -> ReviewOptions {
        ReviewOptions {
            repository_id: "repo-1".into(),
            pull_request_id: 7,
            dry_run,
        }
    }

    #[test]
    fn comment_body_has_severity_category_message_and_fix() {
        let body = format_comment(&issue("/src/auth.cs", Severity::High));
        assert_eq!(
            body,
            "**[HIGH] Security**\n\n> token logged\n\n**Fix:** redact it"
        );
    }

    #[tokio::test]
    async fn failed_inline_post_does_not_stop_the_rest() {
        let git = FlakyGit {
            reject_paths: vec!["/a.cs".into()],
            ..FlakyGit::default()
        };
        let result = ReviewResult {
            issues: vec![issue("/a.cs", Severity::Block), issue("/b.cs", Severity::High)],
            summary: "two issues".into(),
        };

        let output = publish(&git, &options(false), result).await;
        assert_eq!(output.posted_comments, 1);
        assert!(output.summary_posted);

        let threads = git.threads.lock().unwrap();
        // One surviving inline thread plus the summary thread.
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].anchor.as_ref().unwrap().file_path, "/b.cs");
        assert!(threads[1].anchor.is_none());
    }

    #[tokio::test]
    async fn failed_summary_is_reported_not_fatal() {
        let git = FlakyGit {
            reject_summary: true,
            ..FlakyGit::default()
        };
        let result = ReviewResult {
            issues: vec![issue("/a.cs", Severity::Medium)],
            summary: "one issue".into(),
        };

        let output = publish(&git, &options(false), result).await;
        assert_eq!(output.posted_comments, 1);
        assert!(!output.summary_posted);
    }

    #[tokio::test]
    async fn dry_run_posts_nothing() {
        let git = FlakyGit::default();
        let result = ReviewResult {
            issues: vec![issue("/a.cs", Severity::Block)],
            summary: "one issue".into(),
        };

        let output = publish(&git, &options(true), result).await;
        assert_eq!(output.posted_comments, 0);
        assert!(!output.summary_posted);
        assert!(git.threads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_critique_still_posts_the_summary() {
        let git = FlakyGit::default();
        let result = ReviewResult {
            issues: Vec::new(),
            summary: "Ship it!".into(),
        };

        let output = publish(&git, &options(false), result).await;
        assert_eq!(output.posted_comments, 0);
        assert!(output.summary_posted);

        let threads = git.threads.lock().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].content, "Ship it!");
    }
}
