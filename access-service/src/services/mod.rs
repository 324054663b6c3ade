pub mod aggregate;
pub mod client;
pub mod collector;
pub mod metrics;
pub mod walkers;

pub use aggregate::{aggregate, aggregate_report, parse_group_id, AccessReport, AggregateOptions};
pub use client::{GitLabClient, PaginationMode};
pub use collector::{Collector, UserAccumulator};
pub use walkers::{FailurePolicy, HierarchyWalker, Strategy};
