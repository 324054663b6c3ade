//! `GET /groups/:id/access`: the aggregation exposed over HTTP.

use crate::models::{AccessWarning, UserRecord};
use crate::services::aggregate::{aggregate_report, parse_group_id, AggregateOptions};
use crate::services::walkers::{FailurePolicy, Strategy};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::time::Instant;

#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    pub strategy: Option<String>,
    pub failure_policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub group_id: i64,
    pub strategy: Strategy,
    pub failure_policy: FailurePolicy,
    pub total_users: usize,
    pub elapsed_ms: u64,
    pub users: Vec<UserRecord>,
    pub warnings: Vec<AccessWarning>,
}

pub async fn group_access(
    State(state): State<AppState>,
    Path(raw_group_id): Path<String>,
    Query(query): Query<AccessQuery>,
    headers: HeaderMap,
) -> Result<Json<AccessResponse>, AppError> {
    let group_id = parse_group_id(&raw_group_id)?;
    let options = resolve_options(&query, state.config.aggregation.default_strategy)?;
    let credential = bearer_token(&headers)
        .map(Secret::new)
        .or_else(|| state.config.gitlab.default_token.clone())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "An access token is required: send 'Authorization: Bearer <token>'"
            ))
        })?;

    let started = Instant::now();
    let report = aggregate_report(
        &state.client,
        group_id,
        credential.expose_secret(),
        options,
    )
    .await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    Ok(Json(AccessResponse {
        group_id,
        strategy: report.strategy,
        failure_policy: report.failure_policy,
        total_users: report.users.len(),
        elapsed_ms,
        users: report.users,
        warnings: report.warnings,
    }))
}

fn resolve_options(
    query: &AccessQuery,
    default_strategy: Strategy,
) -> Result<AggregateOptions, AppError> {
    let strategy = match query.strategy.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse::<Strategy>()
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?,
        _ => default_strategy,
    };

    let mut options = AggregateOptions::new(strategy);
    if let Some(raw) = query.failure_policy.as_deref() {
        let policy = raw
            .parse::<FailurePolicy>()
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;
        options = options.with_failure_policy(policy);
    }

    Ok(options)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer glpat-123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("glpat-123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn options_fall_back_to_default_strategy() {
        let options = resolve_options(&AccessQuery::default(), Strategy::Dfs).unwrap();
        assert_eq!(options.strategy, Strategy::Dfs);
        assert_eq!(options.failure_policy, None);
    }

    #[test]
    fn options_parse_query_values() {
        let query = AccessQuery {
            strategy: Some("descendant-par".to_string()),
            failure_policy: Some("best-effort".to_string()),
        };
        let options = resolve_options(&query, Strategy::Batched).unwrap();
        assert_eq!(options.strategy, Strategy::Parallel);
        assert_eq!(options.failure_policy, Some(FailurePolicy::BestEffort));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let query = AccessQuery {
            strategy: Some("bfs".to_string()),
            failure_policy: None,
        };
        assert!(matches!(
            resolve_options(&query, Strategy::Batched),
            Err(AppError::BadRequest(_))
        ));
    }
}
