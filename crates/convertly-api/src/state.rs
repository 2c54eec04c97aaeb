//! Application state shared across all handlers.

use std::sync::Arc;

use convertly_core::config::AppConfig;
use convertly_core::traits::ObjectStore;
use convertly_database::JobStore;
use convertly_worker::JobDispatcher;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Job submission entry point.
    pub dispatcher: Arc<JobDispatcher>,
    /// Job record store, read directly by the status endpoint.
    pub job_store: Arc<dyn JobStore>,
    /// Object store backing transformations and downloads.
    pub object_store: Arc<dyn ObjectStore>,
}
