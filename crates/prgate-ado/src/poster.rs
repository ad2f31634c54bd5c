use prgate_core::GateError;

use crate::service::{CommentThread, GitService, InlineAnchor, ThreadStatus};

/// An inline comment to anchor at a file and line.
#[derive(Debug, Clone)]
pub struct InlineComment {
    /// Repository path of the file; a leading slash is added if missing.
    pub file_path: String,
    /// 1-based line number in the new version of the file.
    pub line: u32,
    /// Markdown body.
    pub content: String,
}

/// Posts review comments to a pull request as comment threads.
pub struct CommentPoster<C> {
    git: C,
}

impl<C: GitService> CommentPoster<C> {
    /// Create a poster over a service handle.
    pub fn new(git: C) -> Self {
        Self { git }
    }

    /// Post one inline comment as an active thread anchored on the right
    /// (new) side of the file.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Post`] when thread creation fails. Callers
    /// treat this as recoverable per comment.
    pub async fn post_inline(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        comment: &InlineComment,
    ) -> Result<u64, GateError> {
        let thread = CommentThread {
            content: comment.content.clone(),
            anchor: Some(InlineAnchor {
                file_path: normalize_path(&comment.file_path),
                line: comment.line,
            }),
            status: ThreadStatus::Active,
        };
        self.git
            .create_thread(repository_id, pull_request_id, &thread)
            .await
    }

    /// Post the run's summary as a single closed thread with no file
    /// anchor.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Post`] when thread creation fails.
    pub async fn post_summary(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        content: &str,
    ) -> Result<u64, GateError> {
        let thread = CommentThread {
            content: content.to_string(),
            anchor: None,
            status: ThreadStatus::Closed,
        };
        self.git
            .create_thread(repository_id, pull_request_id, &thread)
            .await
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
