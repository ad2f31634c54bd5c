use chrono::Utc;
use prgate_core::{
    ChangeKind, FileChange, FileDiff, GateError, PullRequestDiff, PullRequestInfo,
};

use crate::diff;
use crate::service::{ChangeEntry, GitService};

/// Aggregates a pull request's metadata and per-file diffs into one
/// [`PullRequestDiff`].
///
/// Unrecoverable upstream errors (PR lookup, iteration listing)
/// propagate to the caller; blob fetch failures degrade to empty
/// content instead of aborting the review.
pub struct PullRequestFetcher<C> {
    git: C,
}

impl<C: GitService> PullRequestFetcher<C> {
    /// Create a fetcher over a service handle.
    pub fn new(git: C) -> Self {
        Self { git }
    }

    /// Fetch and normalize pull request metadata.
    ///
    /// Optional upstream fields default to empty strings, branch names
    /// lose their `refs/heads/` prefix, and a missing creation date
    /// falls back to the current time. The fallback is lossy but a
    /// missing timestamp should not fail the review.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Fetch`] when the pull request lookup fails.
    pub async fn fetch_pull_request(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<PullRequestInfo, GateError> {
        let remote = self.git.pull_request(repository_id, pull_request_id).await?;

        Ok(PullRequestInfo {
            id: remote.id,
            title: remote.title.unwrap_or_default(),
            description: remote.description.unwrap_or_default(),
            source_branch: strip_ref_prefix(remote.source_ref.unwrap_or_default()),
            target_branch: strip_ref_prefix(remote.target_ref.unwrap_or_default()),
            author_name: remote.author_name.unwrap_or_default(),
            author_email: remote.author_email.unwrap_or_default(),
            created: remote.created.unwrap_or_else(Utc::now),
            status: remote.status.unwrap_or_default(),
            repository_id: remote
                .repository_id
                .unwrap_or_else(|| repository_id.to_string()),
            project_name: remote.project_name.unwrap_or_default(),
        })
    }

    /// List the changed files of the latest iteration.
    ///
    /// A pull request may transiently have zero iterations; that yields
    /// an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Fetch`] when iteration or change listing
    /// fails.
    pub async fn fetch_changed_files(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<FileChange>, GateError> {
        let iterations = self.git.iterations(repository_id, pull_request_id).await?;
        let Some(latest) = iterations.last() else {
            return Ok(Vec::new());
        };

        let changes = self
            .git
            .iteration_changes(repository_id, pull_request_id, latest.id)
            .await?;

        Ok(changes
            .into_iter()
            .map(|entry| FileChange {
                path: entry.path.unwrap_or_default(),
                kind: ChangeKind::from_code(entry.change_type),
                original_path: entry.original_path,
            })
            .collect())
    }

    /// Synthesize the unified diff for one file from its blob pair.
    ///
    /// Either object id may be absent (pure add or delete). A failed
    /// blob fetch substitutes empty content for that side rather than
    /// propagating: a missing historical blob should degrade the diff,
    /// not abort the review.
    pub async fn fetch_file_diff(
        &self,
        repository_id: &str,
        file_path: &str,
        original_object_id: Option<&str>,
        modified_object_id: Option<&str>,
    ) -> String {
        let original = self.blob_or_empty(repository_id, original_object_id).await;
        let modified = self.blob_or_empty(repository_id, modified_object_id).await;
        diff::synthesize(file_path, &original, &modified)
    }

    async fn blob_or_empty(&self, repository_id: &str, object_id: Option<&str>) -> String {
        match object_id {
            Some(id) => self
                .git
                .blob_content(repository_id, id)
                .await
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Fetch the complete diff view of a pull request.
    ///
    /// Composes metadata, the full changed-file list, and a re-fetched
    /// iteration-scoped change list used for diffing. The two lists are
    /// surfaced independently; they may diverge if a new iteration lands
    /// mid-run and are deliberately not reconciled.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Fetch`] when any metadata or listing call
    /// fails. Blob failures do not propagate.
    pub async fn fetch_full_diff(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<PullRequestDiff, GateError> {
        let pr = self.fetch_pull_request(repository_id, pull_request_id).await?;
        let files = self
            .fetch_changed_files(repository_id, pull_request_id)
            .await?;

        let iterations = self.git.iterations(repository_id, pull_request_id).await?;
        let mut diffs = Vec::new();

        if let Some(latest) = iterations.last() {
            let changes = self
                .git
                .iteration_changes(repository_id, pull_request_id, latest.id)
                .await?;

            for entry in changes {
                let Some(path) = diffable_path(&entry) else {
                    continue;
                };
                let diff = self
                    .fetch_file_diff(
                        repository_id,
                        &path,
                        entry.original_object_id.as_deref(),
                        entry.object_id.as_deref(),
                    )
                    .await;
                diffs.push(FileDiff {
                    path,
                    diff,
                    original_path: entry.original_path,
                });
            }
        }

        Ok(PullRequestDiff { pr, files, diffs })
    }
}

fn strip_ref_prefix(branch: String) -> String {
    match branch.strip_prefix("refs/heads/") {
        Some(stripped) => stripped.to_string(),
        None => branch,
    }
}

fn diffable_path(entry: &ChangeEntry) -> Option<String> {
    match &entry.path {
        Some(path) if !path.is_empty() && !entry.is_folder => Some(path.clone()),
        _ => None,
    }
}
