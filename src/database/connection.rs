//! PostgreSQL pool, migrations and the change-trigger check
//!
//! The migrations install `notify_row_change`, which announces every write to
//! the synchronized tables on [`TRIGGER_CHANNEL`]. The listener has to LISTEN
//! on the same channel or live views never refresh.

use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};
use crate::config::DatabaseConfig;
use crate::utils::errors::Result;

pub type DatabasePool = Pool<Postgres>;

/// Channel hardcoded in `migrations/0001_initial.sql`
pub const TRIGGER_CHANNEL: &str = "hostel_changes";

/// Pool sizing and timeouts for the hostel database
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            ..Self::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/hostelflow".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Open the pool and make one round trip before handing it out
pub async fn create_pool(config: &PoolConfig) -> Result<DatabasePool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?;

    health_check(&pool).await?;
    info!(max_connections = config.max_connections, "Hostel database pool ready");
    Ok(pool)
}

/// Create the hostel tables and the change trigger
pub async fn run_migrations(pool: &DatabasePool) -> Result<()> {
    info!("Applying hostel schema migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn health_check(pool: &DatabasePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Whether the installed change trigger notifies on `channel`.
/// `false` when the trigger function is missing.
pub async fn trigger_notifies_on(pool: &DatabasePool, channel: &str) -> Result<bool> {
    let source: Option<String> =
        sqlx::query_scalar("SELECT prosrc FROM pg_proc WHERE proname = 'notify_row_change'")
            .fetch_optional(pool)
            .await?;

    let notifies = source.is_some_and(|src| src.contains(&format!("'{}'", channel)));
    if !notifies {
        warn!(channel = channel, installed = TRIGGER_CHANNEL, "Change trigger does not notify on the configured channel");
    }
    Ok(notifies)
}
