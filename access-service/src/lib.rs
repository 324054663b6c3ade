pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use config::AccessConfig;
use services::GitLabClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub client: GitLabClient,
}
