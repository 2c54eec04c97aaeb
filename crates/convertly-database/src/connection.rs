//! PostgreSQL connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use convertly_core::config::DatabaseConfig;
use convertly_core::error::{AppError, ErrorKind};

/// Create a PostgreSQL connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    info!(
        url = %mask_password(&config.url),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to PostgreSQL"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to connect to PostgreSQL", e)
        })
}

/// Mask the password portion of a connection URL for logging.
fn mask_password(url: &str) -> String {
    match url.find("://").zip(url.rfind('@')) {
        Some((scheme_end, at)) => {
            let credentials_start = scheme_end + 3;
            match url[credentials_start..at].find(':') {
                Some(colon) => format!(
                    "{}:****{}",
                    &url[..credentials_start + colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password_hides_secret() {
        let masked = mask_password("postgres://convertly:hunter2@db:5432/convertly");
        assert_eq!(masked, "postgres://convertly:****@db:5432/convertly");
    }

    #[test]
    fn test_mask_password_without_credentials() {
        let url = "postgres://db:5432/convertly";
        assert_eq!(mask_password(url), url);
    }
}
