use std::time::Duration;

use chrono::{DateTime, Utc};
use prgate_core::GateError;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::auth::PatAuthenticator;
use crate::service::{
    ChangeEntry, CommentThread, GitService, IterationRef, RemotePullRequest, ThreadStatus,
};

const API_VERSION: &str = "7.1";

/// Authenticated HTTP handle to the service, created on first use.
struct Connection {
    http: reqwest::Client,
    token: String,
}

impl Connection {
    // PATs are sent as Basic auth with an empty username; bearer auth is
    // reserved for Entra tokens.
    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url).basic_auth("", Some(&self.token))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.post(url).basic_auth("", Some(&self.token))
    }
}

/// Client for one Azure DevOps organization + project.
///
/// The underlying connection is initialized lazily on the first call and
/// memoized for the lifetime of the client; it is never reset. A
/// transient auth failure during creation is retried by constructing a
/// new client, not by re-invoking the same one.
///
/// # Examples
///
/// ```
/// use prgate_ado::auth::PatAuthenticator;
/// use prgate_ado::client::AdoClient;
///
/// let client = AdoClient::new("contoso", "Platform", PatAuthenticator::default()).unwrap();
/// assert_eq!(client.org_url(), "https://dev.azure.com/contoso");
/// ```
pub struct AdoClient {
    org_url: String,
    project: String,
    auth: PatAuthenticator,
    connection: OnceCell<Connection>,
}

impl AdoClient {
    /// Create a client for `organization`/`project`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] when the organization name is empty.
    pub fn new(
        organization: &str,
        project: &str,
        auth: PatAuthenticator,
    ) -> Result<Self, GateError> {
        if organization.is_empty() {
            return Err(GateError::Config("organization name is required".into()));
        }
        Ok(Self {
            org_url: format!("https://dev.azure.com/{organization}"),
            project: project.to_string(),
            auth,
            connection: OnceCell::new(),
        })
    }

    /// Base URL of the organization.
    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    async fn connection(&self) -> Result<&Connection, GateError> {
        self.connection
            .get_or_try_init(|| async {
                let token = self.auth.token()?;
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(60))
                    .build()
                    .map_err(|e| GateError::Fetch(format!("failed to create HTTP client: {e}")))?;
                Ok(Connection { http, token })
            })
            .await
    }

    fn repo_url(&self, repository_id: &str, tail: &str) -> String {
        format!(
            "{}/{}/_apis/git/repositories/{repository_id}/{tail}",
            self.org_url, self.project
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GateError> {
        let conn = self.connection().await?;
        let response = conn
            .get(url)
            .send()
            .await
            .map_err(|e| GateError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::Fetch(format!(
                "Azure DevOps API error {status} for {url}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GateError::Fetch(format!("failed to decode response from {url}: {e}")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePullRequest {
    pull_request_id: u64,
    title: Option<String>,
    description: Option<String>,
    source_ref_name: Option<String>,
    target_ref_name: Option<String>,
    created_by: Option<WireIdentity>,
    creation_date: Option<DateTime<Utc>>,
    status: Option<String>,
    repository: Option<WireRepository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdentity {
    display_name: Option<String>,
    unique_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRepository {
    id: Option<String>,
    project: Option<WireProject>,
}

#[derive(Deserialize)]
struct WireProject {
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireList<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
struct WireIteration {
    id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChanges {
    #[serde(default)]
    change_entries: Vec<WireChangeEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChangeEntry {
    #[serde(default)]
    change_type: u32,
    item: Option<WireItem>,
    original_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    path: Option<String>,
    #[serde(default)]
    is_folder: bool,
    object_id: Option<String>,
    original_object_id: Option<String>,
}

#[derive(Deserialize)]
struct WireThread {
    id: u64,
}

impl GitService for AdoClient {
    async fn pull_request(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<RemotePullRequest, GateError> {
        let url = self.repo_url(
            repository_id,
            &format!("pullRequests/{pull_request_id}?api-version={API_VERSION}"),
        );
        let wire: WirePullRequest = self.get_json(&url).await?;

        let (author_name, author_email) = match wire.created_by {
            Some(identity) => (identity.display_name, identity.unique_name),
            None => (None, None),
        };
        let (repo_id, project_name) = match wire.repository {
            Some(repo) => (repo.id, repo.project.and_then(|p| p.name)),
            None => (None, None),
        };

        Ok(RemotePullRequest {
            id: wire.pull_request_id,
            title: wire.title,
            description: wire.description,
            source_ref: wire.source_ref_name,
            target_ref: wire.target_ref_name,
            author_name,
            author_email,
            created: wire.creation_date,
            status: wire.status,
            repository_id: repo_id,
            project_name,
        })
    }

    async fn iterations(
        &self,
        repository_id: &str,
        pull_request_id: u64,
    ) -> Result<Vec<IterationRef>, GateError> {
        let url = self.repo_url(
            repository_id,
            &format!("pullRequests/{pull_request_id}/iterations?api-version={API_VERSION}"),
        );
        let wire: WireList<WireIteration> = self.get_json(&url).await?;
        Ok(wire
            .value
            .into_iter()
            .map(|i| IterationRef { id: i.id })
            .collect())
    }

    async fn iteration_changes(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<ChangeEntry>, GateError> {
        let url = self.repo_url(
            repository_id,
            &format!(
                "pullRequests/{pull_request_id}/iterations/{iteration_id}/changes\
                 ?api-version={API_VERSION}"
            ),
        );
        let wire: WireChanges = self.get_json(&url).await?;
        Ok(wire
            .change_entries
            .into_iter()
            .map(|entry| {
                let (path, is_folder, object_id, original_object_id) = match entry.item {
                    Some(item) => (
                        item.path,
                        item.is_folder,
                        item.object_id,
                        item.original_object_id,
                    ),
                    None => (None, false, None, None),
                };
                ChangeEntry {
                    path,
                    is_folder,
                    change_type: entry.change_type,
                    object_id,
                    original_object_id,
                    original_path: entry.original_path,
                }
            })
            .collect())
    }

    async fn blob_content(
        &self,
        repository_id: &str,
        object_id: &str,
    ) -> Result<String, GateError> {
        let url = self.repo_url(
            repository_id,
            &format!("blobs/{object_id}?api-version={API_VERSION}&$format=text"),
        );
        let conn = self.connection().await?;
        let response = conn
            .get(&url)
            .send()
            .await
            .map_err(|e| GateError::Fetch(format!("blob fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Fetch(format!(
                "Azure DevOps API error {status} fetching blob {object_id}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| GateError::Fetch(format!("failed to read blob {object_id}: {e}")))
    }

    async fn create_thread(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        thread: &CommentThread,
    ) -> Result<u64, GateError> {
        let url = self.repo_url(
            repository_id,
            &format!("pullRequests/{pull_request_id}/threads?api-version={API_VERSION}"),
        );

        // Thread status wire codes: 1 = active, 4 = closed.
        let status_code = match thread.status {
            ThreadStatus::Active => 1,
            ThreadStatus::Closed => 4,
        };
        let mut body = serde_json::json!({
            "comments": [{ "content": thread.content, "commentType": 1 }],
            "status": status_code,
        });
        if let Some(anchor) = &thread.anchor {
            body["threadContext"] = serde_json::json!({
                "filePath": anchor.file_path,
                "rightFileStart": { "line": anchor.line, "offset": 1 },
                "rightFileEnd": { "line": anchor.line, "offset": 1 },
            });
        }

        let conn = self.connection().await?;
        let response = conn
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Post(format!("thread creation failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::Post(format!(
                "Azure DevOps API error {status} creating thread: {body}"
            )));
        }

        let wire: WireThread = response
            .json()
            .await
            .map_err(|e| GateError::Post(format!("failed to decode thread response: {e}")))?;
        Ok(wire.id)
    }
}
