//! Per-user aggregate of group and project grants.

use super::{AccessLevel, MembershipGrant};
use serde::Serialize;

/// Everything one user can reach under the aggregated root.
///
/// `groups` and `projects` hold `"<resource> (<level>)"` labels in the order
/// rosters were processed, which depends on the strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub groups: Vec<String>,
    pub projects: Vec<String>,
}

impl UserRecord {
    /// Seed an empty record from the first grant seen for this user.
    pub fn from_grant(grant: &MembershipGrant) -> Self {
        Self {
            id: grant.user_id,
            name: grant.name.clone(),
            username: grant.username.clone(),
            groups: Vec::new(),
            projects: Vec::new(),
        }
    }
}

/// Format a grant the way it appears in a record.
pub fn grant_label(resource_name: &str, level: AccessLevel) -> String {
    format!("{} ({})", resource_name, level)
}

/// Non-fatal findings collected while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessWarning {
    /// A roster row carried a code outside the known access levels.
    UndefinedAccessLevel {
        resource: String,
        user_id: u64,
        code: i64,
    },
    /// A fetch failed and the resource was treated as empty.
    ResourceSkipped { resource: String, error: String },
}
