//! gitlab::client
//!
//! GitLab v4 client for protected-branch operations.
//!
//! # Request primitive
//!
//! Every call goes through [`GitLabClient::request`], which:
//! - appends each path segment to `{api_base}` percent-encoded, so a project
//!   path `acme/widgets` or a branch `release/1.0` stays one segment (`%2F`);
//! - percent-encodes every query key and value;
//! - sends `PRIVATE-TOKEN: <token>`;
//! - serializes POST bodies as JSON with `content-type: application/json`;
//! - decodes the response body as JSON unless the content-type is text.
//!
//! Non-2xx statuses come back as [`GitLabError`] values carrying the body.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use super::error::{GitLabError, ResponseBody};
use super::transport::{HttpRequest, HttpTransport, Method, ReqwestTransport, TransportError};
use super::types::{ListProtectedBranchesQuery, ProtectBranchPayload, ProtectedBranch};
use crate::remote::RemoteIdentity;

/// Header carrying the personal access token.
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// GitLab project identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectId {
    /// Numeric project id
    Numeric(u64),
    /// `namespace/project` path
    Path(String),
}

impl ProjectId {
    /// Project id for a parsed remote.
    pub fn from_remote(remote: &RemoteIdentity) -> Self {
        ProjectId::Path(remote.project_path())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Numeric(id) => write!(f, "{}", id),
            ProjectId::Path(path) => f.write_str(path),
        }
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        ProjectId::Numeric(id)
    }
}

impl From<&str> for ProjectId {
    fn from(path: &str) -> Self {
        match path.parse::<u64>() {
            Ok(id) => ProjectId::Numeric(id),
            Err(_) => ProjectId::Path(path.to_string()),
        }
    }
}

/// Protected-branch operations against a GitLab instance.
///
/// Implemented by [`GitLabClient`] and by
/// [`MockGitLab`](super::mock::MockGitLab) for tests.
#[async_trait]
pub trait ProtectedBranchApi: Send + Sync {
    /// Fetch the protection rule for a branch.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch is not protected (an expected outcome)
    /// - `Api` for any other non-2xx response
    async fn get_branch_protection(
        &self,
        project: &ProjectId,
        branch: &str,
    ) -> Result<ProtectedBranch, GitLabError>;

    /// Remove protection from a branch.
    ///
    /// Idempotent: removing protection from an unprotected branch succeeds.
    async fn unprotect_branch(&self, project: &ProjectId, branch: &str) -> Result<(), GitLabError>;

    /// Protect a branch.
    ///
    /// # Errors
    ///
    /// - `Api` (409 or 422) if the branch is already protected
    async fn protect_branch(
        &self,
        project: &ProjectId,
        payload: &ProtectBranchPayload,
    ) -> Result<ProtectedBranch, GitLabError>;

    /// List protected branches of a project.
    async fn list_protected_branches(
        &self,
        project: &ProjectId,
        query: &ListProtectedBranchesQuery,
    ) -> Result<Vec<ProtectedBranch>, GitLabError>;
}

/// HTTP client for the GitLab v4 API.
pub struct GitLabClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    token: String,
}

// Custom Debug to avoid exposing the token
impl fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabClient")
            .field("api_base", &self.api_base)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl GitLabClient {
    /// Create a client with an explicit transport.
    ///
    /// `api_base` is the API root, e.g. `https://gitlab.example.com/api/v4`.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_base: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Create a client using [`ReqwestTransport`] with the given timeout.
    pub fn with_reqwest(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, GitLabError> {
        let transport = ReqwestTransport::new(timeout).map_err(GitLabError::from)?;
        Ok(Self::new(Arc::new(transport), api_base, token))
    }

    /// The API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the URL for a sequence of raw (unencoded) path segments.
    pub fn build_url(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Url, GitLabError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| GitLabError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GitLabError::InvalidUrl(format!("{}: cannot be a base", self.api_base)))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Shared request primitive.
    ///
    /// Returns the decoded body for 2xx responses. A 404 becomes
    /// `GitLabError::NotFound`; any other non-2xx becomes `GitLabError::Api`.
    #[instrument(level = "debug", skip(self, query, body), fields(api_base = %self.api_base))]
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<ResponseBody, GitLabError> {
        let url = self.build_url(segments, query)?;

        let mut headers = vec![(TOKEN_HEADER.to_string(), self.token.clone())];
        let body = match body {
            Some(b) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_vec(b).map_err(|e| GitLabError::Decode(e.to_string()))?)
            }
            None => None,
        };

        debug!(%method, path = url.path(), "sending GitLab request");
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await?;
        debug!(%method, path = url.path(), status = response.status, "GitLab responded");

        let decoded = ResponseBody::decode(response.content_type.as_deref(), &response.body);
        if response.is_success() {
            Ok(decoded)
        } else if response.status == 404 {
            Err(GitLabError::NotFound {
                resource: url.path().to_string(),
                body: decoded,
            })
        } else {
            Err(GitLabError::Api {
                status: response.status,
                body: decoded,
            })
        }
    }

    /// Deserialize a 2xx body into a typed value.
    fn parse<T: DeserializeOwned>(body: ResponseBody) -> Result<T, GitLabError> {
        match body {
            ResponseBody::Json(value) => {
                serde_json::from_value(value).map_err(|e| GitLabError::Decode(e.to_string()))
            }
            ResponseBody::Text(text) => Err(GitLabError::Decode(format!(
                "expected JSON, got text: {}",
                text
            ))),
            ResponseBody::Empty => Err(GitLabError::Decode("expected JSON, got empty body".into())),
        }
    }
}

impl From<TransportError> for GitLabError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(d) => GitLabError::Timeout(d),
            TransportError::Network(msg) => GitLabError::Transport(msg),
        }
    }
}

#[async_trait]
impl ProtectedBranchApi for GitLabClient {
    async fn get_branch_protection(
        &self,
        project: &ProjectId,
        branch: &str,
    ) -> Result<ProtectedBranch, GitLabError> {
        let project = project.to_string();
        let body = self
            .request::<()>(
                Method::Get,
                &["projects", &project, "protected_branches", branch],
                &[],
                None,
            )
            .await?;
        Self::parse(body)
    }

    async fn unprotect_branch(&self, project: &ProjectId, branch: &str) -> Result<(), GitLabError> {
        let project = project.to_string();
        let result = self
            .request::<()>(
                Method::Delete,
                &["projects", &project, "protected_branches", branch],
                &[],
                None,
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(GitLabError::NotFound { .. }) => {
                debug!(branch, "branch already unprotected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn protect_branch(
        &self,
        project: &ProjectId,
        payload: &ProtectBranchPayload,
    ) -> Result<ProtectedBranch, GitLabError> {
        let project = project.to_string();
        let body = self
            .request(
                Method::Post,
                &["projects", &project, "protected_branches"],
                &[],
                Some(payload),
            )
            .await?;
        Self::parse(body)
    }

    async fn list_protected_branches(
        &self,
        project: &ProjectId,
        query: &ListProtectedBranchesQuery,
    ) -> Result<Vec<ProtectedBranch>, GitLabError> {
        let project = project.to_string();
        let body = self
            .request::<()>(
                Method::Get,
                &["projects", &project, "protected_branches"],
                &query.pairs(),
                None,
            )
            .await?;
        Self::parse(body)
    }
}
