use super::HierarchyWalker;
use crate::error::AccessError;
use crate::models::Group;
use crate::services::collector::Collector;
use async_trait::async_trait;
use futures::future::try_join3;
use std::collections::HashSet;

/// Depth-first walk over `/subgroups` with an explicit stack.
///
/// A group reachable through more than one parent is expanded once.
pub struct DfsWalker;

#[async_trait]
impl HierarchyWalker for DfsWalker {
    async fn walk(&self, root_group_id: u64, collector: &Collector<'_>) -> Result<(), AccessError> {
        let root = collector.group_details(root_group_id).await?;

        let mut visited: HashSet<u64> = HashSet::new();
        let mut stack: Vec<Group> = vec![root];

        while let Some(group) = stack.pop() {
            if !visited.insert(group.id) {
                tracing::trace!(group_id = group.id, "Group already expanded");
                continue;
            }

            let (projects, subgroups, ()) = try_join3(
                collector.group_projects(&group),
                collector.subgroups(&group),
                collector.collect_group_members(&group),
            )
            .await?;

            for project in &projects {
                collector.collect_project_members(project).await?;
            }

            stack.extend(
                subgroups
                    .into_iter()
                    .filter(|subgroup| !visited.contains(&subgroup.id)),
            );
        }

        tracing::debug!(groups = visited.len(), "Depth-first walk finished");
        Ok(())
    }
}
