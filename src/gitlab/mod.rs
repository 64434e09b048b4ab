//! gitlab
//!
//! GitLab v4 REST access for protected branches.
//!
//! # Architecture
//!
//! The [`ProtectedBranchApi`] trait is the seam between the orchestrator and
//! GitLab. [`GitLabClient`] implements it over an [`HttpTransport`]; the
//! production transport is `reqwest`, tests use [`mock::MockGitLab`] or a
//! recording transport.
//!
//! # Modules
//!
//! - `client`: request primitive and the four protected-branch operations
//! - `error`: [`GitLabError`] and decoded [`ResponseBody`]
//! - `transport`: HTTP seam with a bounded timeout
//! - `types`: access levels, protection rules, request payloads
//! - [`mock`]: in-memory GitLab for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use gl_unprotect::gitlab::{GitLabClient, ProjectId, ProtectedBranchApi};
//!
//! let client = GitLabClient::with_reqwest("https://gitlab.com/api/v4", token, timeout)?;
//! let rule = client
//!     .get_branch_protection(&ProjectId::Path("acme/widgets".into()), "main")
//!     .await?;
//! println!("push: {:?}", rule.lowest_push_level());
//! ```

mod client;
mod error;
pub mod mock;
mod transport;
mod types;

pub use client::{GitLabClient, ProjectId, ProtectedBranchApi, TOKEN_HEADER};
pub use error::{GitLabError, ResponseBody};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportError,
    DEFAULT_TIMEOUT,
};
pub use types::{
    AccessLevel, AccessLevelEntry, AccessLevelError, ListProtectedBranchesQuery,
    ProtectBranchPayload, ProtectedBranch, DEFAULT_PROTECT_LEVEL, DEFAULT_UNPROTECT_LEVEL,
};
