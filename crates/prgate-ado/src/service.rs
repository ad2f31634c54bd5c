use chrono::{DateTime, Utc};
use prgate_core::GateError;

/// Pull request as reported by the service, before normalization.
///
/// Every field the service may omit is optional here; the aggregator
/// applies the documented defaults when mapping to
/// [`prgate_core::PullRequestInfo`].
#[derive(Debug, Clone, Default)]
pub struct RemotePullRequest {
    /// Numeric pull request id.
    pub id: u64,
    /// Title, if set.
    pub title: Option<String>,
    /// Description, if set.
    pub description: Option<String>,
    /// Source ref name, usually `refs/heads/...`.
    pub source_ref: Option<String>,
    /// Target ref name, usually `refs/heads/...`.
    pub target_ref: Option<String>,
    /// Author display name.
    pub author_name: Option<String>,
    /// Author contact address.
    pub author_email: Option<String>,
    /// Creation timestamp.
    pub created: Option<DateTime<Utc>>,
    /// Status string.
    pub status: Option<String>,
    /// Owning repository id.
    pub repository_id: Option<String>,
    /// Owning project name.
    pub project_name: Option<String>,
}

/// Reference to one numbered iteration of a pull request.
#[derive(Debug, Clone, Copy)]
pub struct IterationRef {
    /// Iteration id; higher means more recent.
    pub id: u64,
}

/// One change entry within an iteration.
#[derive(Debug, Clone, Default)]
pub struct ChangeEntry {
    /// Path of the changed item.
    pub path: Option<String>,
    /// Whether the item is a folder rather than a file.
    pub is_folder: bool,
    /// Integer change-type code (1 add, 2 edit, 16 delete, 8 rename).
    pub change_type: u32,
    /// Object id of the modified blob, absent for pure deletes.
    pub object_id: Option<String>,
    /// Object id of the original blob, absent for pure adds.
    pub original_object_id: Option<String>,
    /// Prior path, set for renames.
    pub original_path: Option<String>,
}

/// Lifecycle status of a comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    /// Open for discussion.
    Active,
    /// Resolved; used for summary threads.
    Closed,
}

/// File + line anchor for an inline thread, right (new) side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAnchor {
    /// Repository path of the file, with a leading slash.
    pub file_path: String,
    /// 1-based line number in the new version.
    pub line: u32,
}

/// A new comment thread to create on a pull request.
///
/// A thread without an anchor is a pull-request-level summary thread.
#[derive(Debug, Clone)]
pub struct CommentThread {
    /// Markdown body of the single comment in the thread.
    pub content: String,
    /// Inline anchor; `None` for summary threads.
    pub anchor: Option<InlineAnchor>,
    /// Initial status of the thread.
    pub status: ThreadStatus,
}

/// Operations prgate needs from the hosted source-control service.
///
/// Implemented by [`crate::client::AdoClient`] against the Azure DevOps
/// Git REST API, and by in-memory fakes in tests. All calls are
/// sequential awaited operations; implementations do not retry.
#[allow(async_fn_in_trait)]
pub trait GitService {
    /// Look up a pull request by repository and id.
    async fn pull_request(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<RemotePullRequest, GateError>;

    /// List the iterations of a pull request, oldest first.
    async fn iterations(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<IterationRef>, GateError>;

    /// List the change entries of one iteration.
    async fn iteration_changes(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<ChangeEntry>, GateError>;

    /// Fetch blob content by object id as UTF-8 text.
    async fn blob_content(
        &self,
        repository_id: &str,
        object_id: &str,
    ) -> Result<String, GateError>;

    /// Create a comment thread; returns the new thread id.
    async fn create_thread(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        thread: &CommentThread,
    ) -> Result<u64, GateError>;
}

impl<C: GitService> GitService for &C {
    async fn pull_request(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<RemotePullRequest, GateError> {
        (**self).pull_request(repository_id, pull_request_id).await
    }

    async fn iterations(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<IterationRef>, GateError> {
        (**self).iterations(repository_id, pull_request_id).await
    }

    async fn iteration_changes(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<ChangeEntry>, GateError> {
        (**self)
            .iteration_changes(repository_id, pull_request_id, iteration_id)
            .await
    }

    async fn blob_content(
        &self,
        repository_id: &str,
        object_id: &str,
    ) -> Result<String, GateError> {
        (**self).blob_content(repository_id, object_id).await
    }

    async fn create_thread(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        thread: &CommentThread,
    ) -> Result<u64, GateError> {
        (**self)
            .create_thread(repository_id, pull_request_id, thread)
            .await
    }
}
