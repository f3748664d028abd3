use anyhow::{Context, Result, anyhow};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

/// Mask password in database URL for display
pub fn mask_url_password(url: &str) -> String {
    if !url.contains("://") {
        return url.to_string();
    }

    let parts: Vec<&str> = url.splitn(2, "://").collect();
    if parts.len() != 2 {
        return url.to_string();
    }

    let protocol = parts[0];
    let rest = parts[1];

    // user:pass@host or user@host
    if let Some(at_pos) = rest.rfind('@') {
        let user_info = &rest[..at_pos];
        let host_and_path = &rest[at_pos + 1..];

        if let Some(colon_pos) = user_info.find(':') {
            let username = &user_info[..colon_pos];
            return format!("{}://{}:***@{}", protocol, username, host_and_path);
        }
    }

    url.to_string()
}

/// Cluster connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of retries for the initial connection
    pub max_retries: u32,
    /// Delay between connection retries
    pub retry_delay: Duration,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Connect to the cluster with retries and slow statement logging disabled.
///
/// Catalog views on a busy cluster routinely take longer than sqlx's slow
/// statement threshold, and logging them would dump every query to the console.
/// The `label` names the connection in error messages, next to the masked URL.
pub async fn connect_to_cluster(
    url: &str,
    label: &str,
    config: &ConnectionConfig,
) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(url)
        .map_err(|e| anyhow!("Invalid database URL {}: {}", mask_url_password(url), e))?
        .log_slow_statements(LevelFilter::Off, Duration::from_secs(0));

    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let result = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options.clone())
            .await;

        match result {
            Ok(pool) => {
                if attempt > 0 {
                    info!(
                        "Connected to {} (after {} retry{})",
                        label,
                        attempt,
                        if attempt == 1 { "" } else { "ies" }
                    );
                } else {
                    info!("Connected to {}", label);
                }
                return Ok(pool);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < config.max_retries {
                    info!("{} not reachable, retrying...", label);
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
    Err(anyhow!(cause)).with_context(|| {
        format!(
            "Failed to connect to {} at {} after {} attempts",
            label,
            mask_url_password(url),
            config.max_retries + 1
        )
    })
}
