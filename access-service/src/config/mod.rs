use crate::services::client::PaginationMode;
use crate::services::walkers::Strategy;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Page size requested from every collection endpoint.
pub const DEFAULT_PER_PAGE: u32 = 100;

const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gitlab: GitLabConfig,
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the hierarchy API, e.g. `https://gitlab.example.com/api/v4`.
    pub api_url: String,
    pub per_page: u32,
    pub request_timeout_secs: u64,
    /// Used by the HTTP surface when a request brings no bearer token.
    /// The aggregation engine itself only takes explicit credentials.
    pub default_token: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    pub default_strategy: Strategy,
    pub pagination: PaginationMode,
}

impl AccessConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(AccessConfig {
            common: common_config,
            gitlab: GitLabConfig {
                api_url: get_env("GITLAB_API_URL", Some(DEFAULT_API_URL), is_prod)?,
                per_page: parse_env(
                    "GITLAB_PER_PAGE",
                    get_env("GITLAB_PER_PAGE", Some(&DEFAULT_PER_PAGE.to_string()), false)?,
                )?,
                request_timeout_secs: parse_env(
                    "GITLAB_REQUEST_TIMEOUT_SECS",
                    get_env(
                        "GITLAB_REQUEST_TIMEOUT_SECS",
                        Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
                        false,
                    )?,
                )?,
                default_token: env::var("GITLAB_API_TOKEN")
                    .ok()
                    .filter(|token| !token.is_empty())
                    .map(Secret::new),
            },
            aggregation: AggregationConfig {
                default_strategy: parse_env(
                    "ACCESS_DEFAULT_STRATEGY",
                    get_env("ACCESS_DEFAULT_STRATEGY", Some("descendant-v3"), false)?,
                )?,
                pagination: parse_env(
                    "ACCESS_PAGINATION_MODE",
                    get_env("ACCESS_PAGINATION_MODE", Some("accumulate"), false)?,
                )?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
    })
}
