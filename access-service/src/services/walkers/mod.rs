//! Traversal strategies over the group hierarchy.
//!
//! Every walker enumerates the groups and projects reachable from a root
//! group and hands each of them to the [`Collector`]. They differ in how
//! they discover the hierarchy and how much of the work runs concurrently.
//! Concurrency is cooperative: sub-fetches are joined futures on the
//! caller's task, never spawned tasks.

mod descendant;
mod dfs;

pub use descendant::{BatchedWalker, ParallelWalker, SequentialWalker};
pub use dfs::DfsWalker;

use crate::error::AccessError;
use crate::models::Group;
use crate::services::collector::Collector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[async_trait]
pub trait HierarchyWalker: Send + Sync {
    /// Visit the hierarchy under `root_group_id`, collecting memberships
    /// into `collector`.
    async fn walk(&self, root_group_id: u64, collector: &Collector<'_>) -> Result<(), AccessError>;
}

/// Named traversal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Explicit stack over `/subgroups`, guarded by a visited set.
    #[serde(rename = "dfs")]
    Dfs,
    /// `/descendant_groups`, then each group strictly one after another.
    #[serde(rename = "descendant-seq", alias = "sequential")]
    Sequential,
    /// `/descendant_groups`, then one concurrent unit per group.
    #[serde(rename = "descendant-par", alias = "parallel")]
    Parallel,
    /// Root, descendants and subtree projects discovered together, then
    /// every roster fetched in one concurrent batch.
    #[default]
    #[serde(rename = "descendant-v3", alias = "batched")]
    Batched,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Dfs,
        Strategy::Sequential,
        Strategy::Parallel,
        Strategy::Batched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Dfs => "dfs",
            Strategy::Sequential => "descendant-seq",
            Strategy::Parallel => "descendant-par",
            Strategy::Batched => "descendant-v3",
        }
    }

    /// Failure policy used when the caller does not pick one.
    pub fn default_failure_policy(&self) -> FailurePolicy {
        match self {
            Strategy::Dfs | Strategy::Sequential => FailurePolicy::BestEffort,
            Strategy::Parallel | Strategy::Batched => FailurePolicy::FailFast,
        }
    }

    pub fn walker(&self) -> Box<dyn HierarchyWalker> {
        match self {
            Strategy::Dfs => Box::new(DfsWalker),
            Strategy::Sequential => Box::new(SequentialWalker),
            Strategy::Parallel => Box::new(ParallelWalker),
            Strategy::Batched => Box::new(BatchedWalker),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfs" => Ok(Strategy::Dfs),
            "descendant-seq" | "sequential" => Ok(Strategy::Sequential),
            "descendant-par" | "parallel" => Ok(Strategy::Parallel),
            "descendant-v3" | "batched" => Ok(Strategy::Batched),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a walker reacts to a failed per-resource fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Treat the resource as empty, record a warning, keep going.
    BestEffort,
    /// Abort the whole aggregation with the first error.
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::BestEffort => "best-effort",
            FailurePolicy::FailFast => "fail-fast",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(FailurePolicy::BestEffort),
            "fail-fast" | "fail_fast" => Ok(FailurePolicy::FailFast),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root first, then descendants in API order.
fn with_root(root: Group, descendants: Vec<Group>) -> Vec<Group> {
    let mut groups = Vec::with_capacity(descendants.len() + 1);
    groups.push(root);
    groups.extend(descendants);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>(), Ok(strategy));
        }
    }

    #[test]
    fn strategy_aliases() {
        assert_eq!("batched".parse::<Strategy>(), Ok(Strategy::Batched));
        assert_eq!("Sequential".parse::<Strategy>(), Ok(Strategy::Sequential));
        assert_eq!("parallel".parse::<Strategy>(), Ok(Strategy::Parallel));
        assert!("bfs".parse::<Strategy>().is_err());
    }

    #[test]
    fn batched_is_default() {
        assert_eq!(Strategy::default(), Strategy::Batched);
    }

    #[test]
    fn default_failure_policies() {
        assert_eq!(Strategy::Dfs.default_failure_policy(), FailurePolicy::BestEffort);
        assert_eq!(
            Strategy::Sequential.default_failure_policy(),
            FailurePolicy::BestEffort
        );
        assert_eq!(Strategy::Parallel.default_failure_policy(), FailurePolicy::FailFast);
        assert_eq!(Strategy::Batched.default_failure_policy(), FailurePolicy::FailFast);
    }

    #[test]
    fn strategy_deserializes_from_query_value() {
        let strategy: Strategy = serde_json::from_str("\"descendant-par\"").unwrap();
        assert_eq!(strategy, Strategy::Parallel);
        let policy: FailurePolicy = serde_json::from_str("\"best-effort\"").unwrap();
        assert_eq!(policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn root_comes_first() {
        let root = Group {
            id: 1,
            name: "G1".to_string(),
        };
        let child = Group {
            id: 2,
            name: "G2".to_string(),
        };
        let ids: Vec<u64> = with_root(root, vec![child]).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
