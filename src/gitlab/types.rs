//! gitlab::types
//!
//! Protected-branch request and response types.
//!
//! # Read and write shapes
//!
//! GitLab returns a *list* of access-level entries per action (push, merge,
//! unprotect) because a rule may grant several roles, users, or groups. The
//! create endpoint accepts a single *scalar* level per action. Both shapes
//! are modeled here; [`ProtectedBranch::to_payload`] is the only place the
//! list is collapsed into a scalar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for integers or names that are not a GitLab branch access level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessLevelError {
    #[error("invalid access level {0} (valid: 0, 30, 40, 60)")]
    InvalidValue(i64),

    #[error("unknown access level '{0}' (valid: no-one, developer, maintainer, admin)")]
    UnknownName(String),
}

/// Role threshold gating push, merge, or unprotect rights.
///
/// Levels form a strict total order:
/// `NoOne < Developer < Maintainer < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AccessLevel {
    NoOne = 0,
    Developer = 30,
    Maintainer = 40,
    Admin = 60,
}

impl AccessLevel {
    /// Numeric value used on the wire.
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Display label for the level.
    pub fn label(self) -> &'static str {
        match self {
            AccessLevel::NoOne => "No one",
            AccessLevel::Developer => "Developers",
            AccessLevel::Maintainer => "Maintainers",
            AccessLevel::Admin => "Admin",
        }
    }
}

impl TryFrom<i64> for AccessLevel {
    type Error = AccessLevelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccessLevel::NoOne),
            30 => Ok(AccessLevel::Developer),
            40 => Ok(AccessLevel::Maintainer),
            60 => Ok(AccessLevel::Admin),
            other => Err(AccessLevelError::InvalidValue(other)),
        }
    }
}

impl From<AccessLevel> for i64 {
    fn from(level: AccessLevel) -> Self {
        level.value()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccessLevel {
    type Err = AccessLevelError;

    /// Accepts the numeric value or a role name (`no-one`, `developer`,
    /// `maintainer`, `admin`, plural forms allowed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return AccessLevel::try_from(n);
        }

        match trimmed.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "no-one" | "noone" | "none" => Ok(AccessLevel::NoOne),
            "developer" | "developers" => Ok(AccessLevel::Developer),
            "maintainer" | "maintainers" => Ok(AccessLevel::Maintainer),
            "admin" | "admins" => Ok(AccessLevel::Admin),
            _ => Err(AccessLevelError::UnknownName(trimmed.to_string())),
        }
    }
}

/// One entry in a protected branch's access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLevelEntry {
    pub access_level: AccessLevel,
    #[serde(default, rename = "access_level_description")]
    pub description: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<u64>,
}

impl AccessLevelEntry {
    /// Role-based entry with GitLab's standard description.
    pub fn role(access_level: AccessLevel) -> Self {
        Self {
            access_level,
            description: access_level.label().to_string(),
            user_id: None,
            group_id: None,
        }
    }
}

/// Protected branch rule as returned by GitLab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBranch {
    pub name: String,
    #[serde(default)]
    pub push_access_levels: Vec<AccessLevelEntry>,
    #[serde(default)]
    pub merge_access_levels: Vec<AccessLevelEntry>,
    #[serde(default)]
    pub unprotect_access_levels: Vec<AccessLevelEntry>,
}

/// Level used for push and merge when a rule carries no entries for them.
///
/// This matches GitLab's own default for newly protected branches.
pub const DEFAULT_PROTECT_LEVEL: AccessLevel = AccessLevel::Maintainer;

/// Level used for unprotect when a rule carries no unprotect entries.
pub const DEFAULT_UNPROTECT_LEVEL: AccessLevel = AccessLevel::NoOne;

/// Lowest level in an entry list, if any.
fn lowest(entries: &[AccessLevelEntry]) -> Option<AccessLevel> {
    entries.iter().map(|e| e.access_level).min()
}

impl ProtectedBranch {
    /// Lowest push level present in the rule.
    pub fn lowest_push_level(&self) -> Option<AccessLevel> {
        lowest(&self.push_access_levels)
    }

    /// Lowest merge level present in the rule.
    pub fn lowest_merge_level(&self) -> Option<AccessLevel> {
        lowest(&self.merge_access_levels)
    }

    /// Collapse this rule into the scalar shape accepted by the create API.
    ///
    /// Each list is reduced to its lowest level. Empty push/merge lists fall
    /// back to [`DEFAULT_PROTECT_LEVEL`]; an empty unprotect list falls back
    /// to [`DEFAULT_UNPROTECT_LEVEL`].
    pub fn to_payload(&self) -> ProtectBranchPayload {
        ProtectBranchPayload {
            name: self.name.clone(),
            push_access_level: self.lowest_push_level().unwrap_or(DEFAULT_PROTECT_LEVEL),
            merge_access_level: self.lowest_merge_level().unwrap_or(DEFAULT_PROTECT_LEVEL),
            unprotect_access_level: lowest(&self.unprotect_access_levels)
                .unwrap_or(DEFAULT_UNPROTECT_LEVEL),
        }
    }
}

/// Request body for protecting a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectBranchPayload {
    pub name: String,
    pub push_access_level: AccessLevel,
    pub merge_access_level: AccessLevel,
    pub unprotect_access_level: AccessLevel,
}

impl ProtectBranchPayload {
    /// Payload with explicit push/merge levels and the default unprotect level.
    pub fn new(
        name: impl Into<String>,
        push_access_level: AccessLevel,
        merge_access_level: AccessLevel,
    ) -> Self {
        Self {
            name: name.into(),
            push_access_level,
            merge_access_level,
            unprotect_access_level: DEFAULT_UNPROTECT_LEVEL,
        }
    }

    /// Override the unprotect level.
    pub fn with_unprotect_level(mut self, level: AccessLevel) -> Self {
        self.unprotect_access_level = level;
        self
    }
}

/// Query parameters for listing protected branches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListProtectedBranchesQuery {
    /// Substring filter on branch name
    pub search: Option<String>,
    /// Page size (GitLab caps this at 100)
    pub per_page: Option<u32>,
    /// 1-based page number
    pub page: Option<u32>,
}

impl ListProtectedBranchesQuery {
    /// Key/value pairs for the query string. Unset fields are omitted.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}
