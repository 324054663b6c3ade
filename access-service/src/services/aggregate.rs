//! Aggregation entry point: pick a walker, run it, materialize the records.

use crate::error::AccessError;
use crate::models::{AccessWarning, UserRecord};
use crate::services::client::GitLabClient;
use crate::services::collector::Collector;
use crate::services::metrics;
use crate::services::walkers::{FailurePolicy, Strategy};
use serde::Serialize;
use std::time::Instant;
use tracing::instrument;

/// Strategy selection plus an optional failure-policy override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub strategy: Strategy,
    pub failure_policy: Option<FailurePolicy>,
}

impl AggregateOptions {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            failure_policy: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn effective_failure_policy(&self) -> FailurePolicy {
        self.failure_policy
            .unwrap_or_else(|| self.strategy.default_failure_policy())
    }
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub strategy: Strategy,
    pub failure_policy: FailurePolicy,
    /// One record per distinct user id, sorted by id.
    pub users: Vec<UserRecord>,
    pub warnings: Vec<AccessWarning>,
}

/// Parse a caller-supplied group identifier. Anything but a positive
/// integer is rejected.
pub fn parse_group_id(raw: &str) -> Result<i64, AccessError> {
    let trimmed = raw.trim();
    let id: i64 = trimmed.parse().map_err(|_| {
        AccessError::InvalidInput(format!("group id '{}' is not an integer", trimmed))
    })?;
    validate_group_id(id)?;
    Ok(id)
}

fn validate_group_id(id: i64) -> Result<u64, AccessError> {
    if id <= 0 {
        return Err(AccessError::InvalidInput(format!(
            "group id must be a positive integer, got {}",
            id
        )));
    }
    Ok(id as u64)
}

/// Everyone with access to the group `root_group_id`, its subgroups and
/// their projects.
pub async fn aggregate(
    client: &GitLabClient,
    root_group_id: i64,
    credential: &str,
    strategy: Strategy,
) -> Result<Vec<UserRecord>, AccessError> {
    let report = aggregate_report(
        client,
        root_group_id,
        credential,
        AggregateOptions::new(strategy),
    )
    .await?;
    Ok(report.users)
}

/// Same as [`aggregate`], also returning the non-fatal warnings and the
/// policy that was applied.
#[instrument(
    skip(client, credential),
    fields(strategy = %options.strategy, failure_policy = tracing::field::Empty)
)]
pub async fn aggregate_report(
    client: &GitLabClient,
    root_group_id: i64,
    credential: &str,
    options: AggregateOptions,
) -> Result<AccessReport, AccessError> {
    let group_id = validate_group_id(root_group_id)?;
    let policy = options.effective_failure_policy();
    tracing::Span::current().record("failure_policy", policy.as_str());

    let started = Instant::now();
    let collector = Collector::new(client, credential, policy);
    let result = options.strategy.walker().walk(group_id, &collector).await;
    let seconds = started.elapsed().as_secs_f64();

    if let Err(e) = result {
        tracing::error!(error = %e, "Aggregation failed");
        metrics::record_aggregation(options.strategy.as_str(), "error", seconds);
        return Err(e);
    }

    let (users, warnings) = collector.into_accumulator().into_parts();
    metrics::record_aggregation(options.strategy.as_str(), "success", seconds);
    tracing::info!(
        users = users.len(),
        warnings = warnings.len(),
        elapsed_ms = (seconds * 1000.0) as u64,
        "Aggregation complete"
    );

    Ok(AccessReport {
        strategy: options.strategy,
        failure_policy: policy,
        users,
        warnings,
    })
}
