//! gitlab::mock
//!
//! In-memory GitLab for deterministic testing.
//!
//! # Design
//!
//! `MockGitLab` stores protected-branch rules per project and branch, records
//! every call, and can be configured to fail a specific operation. It follows
//! GitLab's semantics closely enough for orchestration tests:
//! - reading an unprotected branch returns `NotFound`
//! - deleting an unprotected branch succeeds
//! - protecting an already-protected branch returns a 409
//!
//! # Example
//!
//! ```
//! use gl_unprotect::gitlab::mock::MockGitLab;
//! use gl_unprotect::gitlab::{AccessLevel, ProjectId, ProtectedBranchApi};
//!
//! # tokio_test_block_on(async {
//! let project = ProjectId::Path("acme/widgets".into());
//! let gitlab = MockGitLab::new().with_rule(&project, "main", AccessLevel::Maintainer, AccessLevel::Admin);
//!
//! let rule = gitlab.get_branch_protection(&project, "main").await.unwrap();
//! assert_eq!(rule.lowest_merge_level(), Some(AccessLevel::Admin));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::client::{ProjectId, ProtectedBranchApi};
use super::error::{GitLabError, ResponseBody};
use super::types::{
    AccessLevel, AccessLevelEntry, ListProtectedBranchesQuery, ProtectBranchPayload,
    ProtectedBranch,
};

/// Mock GitLab for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGitLab {
    inner: Arc<Mutex<MockGitLabInner>>,
}

#[derive(Debug, Default)]
struct MockGitLabInner {
    /// Rules keyed by (project, branch).
    rules: HashMap<(String, String), ProtectedBranch>,
    /// Operation to fail (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_branch_protection with the given error.
    GetProtection(GitLabError),
    /// Fail unprotect_branch with the given error.
    Unprotect(GitLabError),
    /// Fail protect_branch with the given error.
    Protect(GitLabError),
    /// Fail list_protected_branches with the given error.
    List(GitLabError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetProtection {
        project: String,
        branch: String,
    },
    Unprotect {
        project: String,
        branch: String,
    },
    Protect {
        project: String,
        payload: ProtectBranchPayload,
    },
    List {
        project: String,
        search: Option<String>,
    },
}

impl MockGitLab {
    /// Create an empty mock with no protected branches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule with single role entries for push and merge.
    pub fn with_rule(
        self,
        project: &ProjectId,
        branch: &str,
        push: AccessLevel,
        merge: AccessLevel,
    ) -> Self {
        self.with_protected_branch(
            project,
            ProtectedBranch {
                name: branch.to_string(),
                push_access_levels: vec![AccessLevelEntry::role(push)],
                merge_access_levels: vec![AccessLevelEntry::role(merge)],
                unprotect_access_levels: vec![],
            },
        )
    }

    /// Add an arbitrary rule.
    pub fn with_protected_branch(self, project: &ProjectId, rule: ProtectedBranch) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .rules
                .insert((project.to_string(), rule.name.clone()), rule);
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Current rule for a branch (for test verification).
    pub fn rule(&self, project: &ProjectId, branch: &str) -> Option<ProtectedBranch> {
        let inner = self.inner.lock().unwrap();
        inner
            .rules
            .get(&(project.to_string(), branch.to_string()))
            .cloned()
    }

    /// Whether a branch is currently protected.
    pub fn is_protected(&self, project: &ProjectId, branch: &str) -> bool {
        self.rule(project, branch).is_some()
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Option<GitLabError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::GetProtection(e)) if expected == "get" => Some(e.clone()),
            Some(FailOn::Unprotect(e)) if expected == "unprotect" => Some(e.clone()),
            Some(FailOn::Protect(e)) if expected == "protect" => Some(e.clone()),
            Some(FailOn::List(e)) if expected == "list" => Some(e.clone()),
            _ => None,
        }
    }
}

fn not_found(project: &ProjectId, branch: &str) -> GitLabError {
    GitLabError::NotFound {
        resource: format!("/projects/{}/protected_branches/{}", project, branch),
        body: ResponseBody::Json(json!({"message": "404 Not found"})),
    }
}

#[async_trait]
impl ProtectedBranchApi for MockGitLab {
    async fn get_branch_protection(
        &self,
        project: &ProjectId,
        branch: &str,
    ) -> Result<ProtectedBranch, GitLabError> {
        self.record(MockOperation::GetProtection {
            project: project.to_string(),
            branch: branch.to_string(),
        });

        if let Some(e) = self.check_fail("get") {
            return Err(e);
        }

        self.rule(project, branch)
            .ok_or_else(|| not_found(project, branch))
    }

    async fn unprotect_branch(&self, project: &ProjectId, branch: &str) -> Result<(), GitLabError> {
        self.record(MockOperation::Unprotect {
            project: project.to_string(),
            branch: branch.to_string(),
        });

        if let Some(e) = self.check_fail("unprotect") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        inner
            .rules
            .remove(&(project.to_string(), branch.to_string()));
        Ok(())
    }

    async fn protect_branch(
        &self,
        project: &ProjectId,
        payload: &ProtectBranchPayload,
    ) -> Result<ProtectedBranch, GitLabError> {
        self.record(MockOperation::Protect {
            project: project.to_string(),
            payload: payload.clone(),
        });

        if let Some(e) = self.check_fail("protect") {
            return Err(e);
        }

        let key = (project.to_string(), payload.name.clone());
        let mut inner = self.inner.lock().unwrap();
        if inner.rules.contains_key(&key) {
            return Err(GitLabError::Api {
                status: 409,
                body: ResponseBody::Json(json!({
                    "message": format!("Protected branch '{}' already exists", payload.name)
                })),
            });
        }

        let rule = ProtectedBranch {
            name: payload.name.clone(),
            push_access_levels: vec![AccessLevelEntry::role(payload.push_access_level)],
            merge_access_levels: vec![AccessLevelEntry::role(payload.merge_access_level)],
            unprotect_access_levels: vec![AccessLevelEntry::role(payload.unprotect_access_level)],
        };
        inner.rules.insert(key, rule.clone());
        Ok(rule)
    }

    async fn list_protected_branches(
        &self,
        project: &ProjectId,
        query: &ListProtectedBranchesQuery,
    ) -> Result<Vec<ProtectedBranch>, GitLabError> {
        self.record(MockOperation::List {
            project: project.to_string(),
            search: query.search.clone(),
        });

        if let Some(e) = self.check_fail("list") {
            return Err(e);
        }

        let project = project.to_string();
        let inner = self.inner.lock().unwrap();
        let mut rules: Vec<ProtectedBranch> = inner
            .rules
            .iter()
            .filter(|((p, name), _)| {
                *p == project
                    && query
                        .search
                        .as_deref()
                        .map(|s| name.contains(s))
                        .unwrap_or(true)
            })
            .map(|(_, rule)| rule.clone())
            .collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rules)
    }
}
