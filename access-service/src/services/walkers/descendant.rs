//! Walkers built on the API's flattened `/descendant_groups` listing.

use super::{with_root, HierarchyWalker};
use crate::error::AccessError;
use crate::models::Group;
use crate::services::collector::Collector;
use async_trait::async_trait;
use futures::future::{try_join, try_join3, try_join_all, BoxFuture};
use futures::FutureExt;

/// Every group, and every project of each group, strictly in turn.
pub struct SequentialWalker;

#[async_trait]
impl HierarchyWalker for SequentialWalker {
    async fn walk(&self, root_group_id: u64, collector: &Collector<'_>) -> Result<(), AccessError> {
        let root = collector.group_details(root_group_id).await?;
        let descendants = collector.descendant_groups(root_group_id).await?;
        let groups = with_root(root, descendants);

        for group in &groups {
            collector.collect_group_members(group).await?;

            let projects = collector.group_projects(group).await?;
            for project in &projects {
                collector.collect_project_members(project).await?;
            }
        }

        tracing::debug!(groups = groups.len(), "Sequential walk finished");
        Ok(())
    }
}

/// One concurrent unit per group: its roster alongside its projects'
/// rosters.
pub struct ParallelWalker;

#[async_trait]
impl HierarchyWalker for ParallelWalker {
    async fn walk(&self, root_group_id: u64, collector: &Collector<'_>) -> Result<(), AccessError> {
        let (root, descendants) = try_join(
            collector.group_details(root_group_id),
            collector.descendant_groups(root_group_id),
        )
        .await?;
        let groups = with_root(root, descendants);

        let units: Vec<_> = groups
            .iter()
            .map(|group| visit_group(collector, group))
            .collect();
        try_join_all(units).await?;

        tracing::debug!(groups = groups.len(), "Parallel walk finished");
        Ok(())
    }
}

async fn visit_group(collector: &Collector<'_>, group: &Group) -> Result<(), AccessError> {
    let projects = async {
        let projects = collector.group_projects(group).await?;
        let rosters: Vec<_> = projects
            .iter()
            .map(|project| collector.collect_project_members(project))
            .collect();
        try_join_all(rosters).await?;
        Ok::<_, AccessError>(())
    };

    try_join(collector.collect_group_members(group), projects).await?;
    Ok(())
}

/// Discovery in one concurrent stage, collection in a second.
///
/// Projects come from a single subtree-inclusive listing, so project
/// discovery does not wait on group discovery.
pub struct BatchedWalker;

#[async_trait]
impl HierarchyWalker for BatchedWalker {
    async fn walk(&self, root_group_id: u64, collector: &Collector<'_>) -> Result<(), AccessError> {
        let (root, descendants, projects) = try_join3(
            collector.group_details(root_group_id),
            collector.descendant_groups(root_group_id),
            collector.subtree_projects(root_group_id),
        )
        .await?;
        let groups = with_root(root, descendants);

        let mut batch: Vec<BoxFuture<'_, Result<(), AccessError>>> =
            Vec::with_capacity(groups.len() + projects.len());
        batch.extend(
            groups
                .iter()
                .map(|group| collector.collect_group_members(group).boxed()),
        );
        batch.extend(
            projects
                .iter()
                .map(|project| collector.collect_project_members(project).boxed()),
        );

        tracing::debug!(
            groups = groups.len(),
            projects = projects.len(),
            "Collecting rosters in one batch"
        );
        try_join_all(batch).await?;

        Ok(())
    }
}
