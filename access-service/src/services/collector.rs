//! Membership collection and the shared per-user accumulator.

use crate::error::AccessError;
use crate::models::user_record::grant_label;
use crate::models::{AccessLevel, AccessWarning, Group, MembershipGrant, Project, UserRecord};
use crate::services::client::GitLabClient;
use crate::services::metrics;
use crate::services::walkers::FailurePolicy;
use dashmap::DashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
enum ResourceKind {
    Group,
    Project,
}

/// User-id keyed records shared by every collection task of one run.
///
/// Create-or-append for a user happens under that key's shard lock, so
/// concurrent grants for the same user never race while grants for other
/// users proceed independently.
#[derive(Debug, Default)]
pub struct UserAccumulator {
    users: DashMap<u64, UserRecord>,
    warnings: Mutex<Vec<AccessWarning>>,
}

impl UserAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group_grant(&self, group: &Group, grant: &MembershipGrant) {
        self.add_grant(ResourceKind::Group, &group.name, grant);
    }

    pub fn add_project_grant(&self, project: &Project, grant: &MembershipGrant) {
        self.add_grant(ResourceKind::Project, &project.name, grant);
    }

    fn add_grant(&self, kind: ResourceKind, resource_name: &str, grant: &MembershipGrant) {
        let level = AccessLevel::from_code(grant.access_level_code);
        if !level.is_known() {
            tracing::warn!(
                resource = %resource_name,
                user_id = grant.user_id,
                code = grant.access_level_code,
                "Undefined access level code"
            );
            metrics::record_undefined_access_level(grant.access_level_code);
            self.warn(AccessWarning::UndefinedAccessLevel {
                resource: resource_name.to_string(),
                user_id: grant.user_id,
                code: grant.access_level_code,
            });
        }

        let label = grant_label(resource_name, level);
        let mut record = self
            .users
            .entry(grant.user_id)
            .or_insert_with(|| UserRecord::from_grant(grant));

        match kind {
            ResourceKind::Group => record.groups.push(label),
            ResourceKind::Project => record.projects.push(label),
        }
    }

    pub fn warn(&self, warning: AccessWarning) {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(warning);
    }

    /// Materialize the records, sorted by user id, plus collected warnings.
    pub fn into_parts(self) -> (Vec<UserRecord>, Vec<AccessWarning>) {
        let mut users: Vec<UserRecord> = self.users.into_iter().map(|(_, user)| user).collect();
        users.sort_by_key(|user| user.id);

        let warnings = self
            .warnings
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        (users, warnings)
    }
}

/// Fetches rosters and listings for one aggregation run and folds the
/// rosters into its accumulator.
///
/// Per-resource calls honour the run's [`FailurePolicy`]: under best-effort a
/// failure is logged, recorded as a warning and treated as empty. Root
/// discovery calls always propagate their error.
pub struct Collector<'a> {
    client: &'a GitLabClient,
    credential: &'a str,
    policy: FailurePolicy,
    accumulator: UserAccumulator,
}

impl<'a> Collector<'a> {
    pub fn new(client: &'a GitLabClient, credential: &'a str, policy: FailurePolicy) -> Self {
        Self {
            client,
            credential,
            policy,
            accumulator: UserAccumulator::new(),
        }
    }

    pub fn into_accumulator(self) -> UserAccumulator {
        self.accumulator
    }

    pub async fn group_details(&self, group_id: u64) -> Result<Group, AccessError> {
        self.client
            .fetch_one(&format!("/groups/{}", group_id), self.credential)
            .await
    }

    /// API-flattened transitive closure of subgroups under `group_id`.
    pub async fn descendant_groups(&self, group_id: u64) -> Result<Vec<Group>, AccessError> {
        self.client
            .fetch_collection(
                &format!("/groups/{}/descendant_groups", group_id),
                &[],
                self.credential,
            )
            .await
    }

    /// Every project under `group_id`, including those of all descendants.
    pub async fn subtree_projects(&self, group_id: u64) -> Result<Vec<Project>, AccessError> {
        self.client
            .fetch_collection(
                &format!("/groups/{}/projects", group_id),
                &[("include_subgroups", "true")],
                self.credential,
            )
            .await
    }

    /// Projects directly owned by `group`.
    pub async fn group_projects(&self, group: &Group) -> Result<Vec<Project>, AccessError> {
        let result = self
            .client
            .fetch_collection(
                &format!("/groups/{}/projects", group.id),
                &[],
                self.credential,
            )
            .await;
        self.tolerate(|| format!("group {} projects", group.id), result)
    }

    /// Direct subgroups of `group`.
    pub async fn subgroups(&self, group: &Group) -> Result<Vec<Group>, AccessError> {
        let result = self
            .client
            .fetch_collection(
                &format!("/groups/{}/subgroups", group.id),
                &[],
                self.credential,
            )
            .await;
        self.tolerate(|| format!("group {} subgroups", group.id), result)
    }

    pub async fn collect_group_members(&self, group: &Group) -> Result<(), AccessError> {
        let result: Result<Vec<MembershipGrant>, AccessError> = self
            .client
            .fetch_collection(
                &format!("/groups/{}/members", group.id),
                &[],
                self.credential,
            )
            .await;
        let members = self.tolerate(|| format!("group {} members", group.id), result)?;

        for member in &members {
            self.accumulator.add_group_grant(group, member);
        }

        tracing::debug!(group_id = group.id, members = members.len(), "Collected group members");
        Ok(())
    }

    pub async fn collect_project_members(&self, project: &Project) -> Result<(), AccessError> {
        let result: Result<Vec<MembershipGrant>, AccessError> = self
            .client
            .fetch_collection(
                &format!("/projects/{}/members", project.id),
                &[],
                self.credential,
            )
            .await;
        let members = self.tolerate(|| format!("project {} members", project.id), result)?;

        for member in &members {
            self.accumulator.add_project_grant(project, member);
        }

        tracing::debug!(
            project_id = project.id,
            members = members.len(),
            "Collected project members"
        );
        Ok(())
    }

    fn tolerate<T: Default>(
        &self,
        resource: impl FnOnce() -> String,
        result: Result<T, AccessError>,
    ) -> Result<T, AccessError> {
        match (result, self.policy) {
            (Ok(value), _) => Ok(value),
            (Err(e), FailurePolicy::FailFast) => Err(e),
            (Err(e), FailurePolicy::BestEffort) => {
                let resource = resource();
                tracing::warn!(resource = %resource, error = %e, "Skipping resource after fetch failure");
                self.accumulator.warn(AccessWarning::ResourceSkipped {
                    resource,
                    error: e.to_string(),
                });
                Ok(T::default())
            }
        }
    }
}
