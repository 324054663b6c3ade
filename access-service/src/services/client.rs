//! Paginated client for the group/project hierarchy API.
//!
//! Collection endpoints are requested page by page with `per_page`/`page`
//! query parameters; the `x-next-page` response header decides whether
//! another page follows.

use crate::config::GitLabConfig;
use crate::error::AccessError;
use crate::services::metrics;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// What to return when the last page carries no next-page header and is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Return every row gathered so far.
    #[default]
    Accumulate,
    /// Return only the empty final page, dropping earlier pages. Matches the
    /// historical behaviour of the dashboard this service replaced.
    Legacy,
}

impl FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" => Ok(PaginationMode::Accumulate),
            "legacy" => Ok(PaginationMode::Legacy),
            other => Err(format!("unknown pagination mode '{}'", other)),
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaginationMode::Accumulate => f.write_str("accumulate"),
            PaginationMode::Legacy => f.write_str("legacy"),
        }
    }
}

/// HTTP client for the hierarchy API. Holds no per-call state; the
/// credential is passed to every call.
#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    base_url: String,
    per_page: u32,
    pagination: PaginationMode,
}

impl GitLabClient {
    /// Build a client from configuration.
    pub fn new(config: &GitLabConfig, pagination: PaginationMode) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self::with_client(
            client,
            &config.api_url,
            config.per_page,
            pagination,
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        per_page: u32,
        pagination: PaginationMode,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page: per_page.max(1),
            pagination,
        }
    }

    /// Fetch a single object, e.g. `GET /groups/{id}`.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &str,
    ) -> Result<T, AccessError> {
        let response = self.send(path, &[], credential).await?;
        decode(path, response).await
    }

    /// Fetch every page of a collection endpoint and concatenate the rows.
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
        credential: &str,
    ) -> Result<Vec<T>, AccessError> {
        let per_page = self.per_page.to_string();
        let mut accumulated: Vec<T> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_str = page.to_string();
            let mut query: Vec<(&str, &str)> =
                vec![("per_page", per_page.as_str()), ("page", page_str.as_str())];
            query.extend_from_slice(extra_query);

            let response = self.send(path, &query, credential).await?;
            let next = next_page(response.headers());
            let rows: Vec<T> = decode(path, response).await?;

            tracing::debug!(
                path = %path,
                page = page,
                rows = rows.len(),
                next_page = ?next,
                "Fetched collection page"
            );

            if let Some(next) = next {
                accumulated.extend(rows);
                // Only move forward; a repeated or smaller page number would loop.
                page = if next > page { next } else { page + 1 };
                continue;
            }

            if !rows.is_empty() {
                accumulated.extend(rows);
                return Ok(accumulated);
            }

            return Ok(match self.pagination {
                PaginationMode::Accumulate => accumulated,
                PaginationMode::Legacy => {
                    if !accumulated.is_empty() {
                        tracing::warn!(
                            path = %path,
                            dropped = accumulated.len(),
                            "Legacy pagination discarded earlier pages"
                        );
                    }
                    rows
                }
            });
        }
    }

    async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
        credential: &str,
    ) -> Result<Response, AccessError> {
        let url = format!("{}{}", self.base_url, path);
        let kind = endpoint_kind(path);

        let response = self
            .client
            .traced_get(&url)
            .query(query)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Upstream request failed");
                metrics::record_upstream_request(kind, "transport_error");
                AccessError::fetch(path, e)
            })?;

        let status = response.status();
        metrics::record_upstream_request(kind, status.as_str());

        if !status.is_success() {
            tracing::warn!(path = %path, status = %status, "Upstream returned error status");
            return Err(AccessError::Api {
                path: path.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, AccessError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| AccessError::fetch(path, e))?;
    serde_json::from_slice(&body).map_err(|e| AccessError::fetch(path, e))
}

/// Next page number announced by the server. An empty or missing header
/// means the current page is the last one.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    let value = headers.get(NEXT_PAGE_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Metric label for a request path: the last non-numeric segment.
fn endpoint_kind(path: &str) -> &'static str {
    let last = path
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty() && segment.parse::<u64>().is_err())
        .unwrap_or("");

    match (path.starts_with("/projects"), last) {
        (_, "descendant_groups") => "descendant_groups",
        (_, "subgroups") => "subgroups",
        (true, "members") => "project_members",
        (false, "members") => "group_members",
        (_, "projects") => "projects",
        (_, "groups") => "group",
        _ => "other",
    }
}
