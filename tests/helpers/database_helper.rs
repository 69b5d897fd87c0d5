//! Test database helper utilities
//!
//! PostgreSQL tests run only when `TEST_DATABASE_URL` points at a scratch
//! database; otherwise they are skipped.

use hostelflow::database::{create_pool, run_migrations, DatabasePool, PoolConfig};

pub struct TestDatabase {
    pub pool: DatabasePool,
    pub database_url: String,
}

impl TestDatabase {
    /// Connect and migrate, or `None` when no test database is configured
    pub async fn from_env() -> Option<Self> {
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
                return None;
            }
        };

        let config = PoolConfig {
            url: database_url.clone(),
            max_connections: 5,
            ..PoolConfig::default()
        };
        let pool = create_pool(&config).await.expect("connect to test database");
        run_migrations(&pool).await.expect("migrate test database");

        Some(Self { pool, database_url })
    }

    /// Empty every hostel table
    pub async fn reset(&self) {
        sqlx::query(
            "TRUNCATE movement_logs, gate_passes, maintenance_tickets, attendance_records, hostelmates, user_roles, profiles",
        )
        .execute(&self.pool)
        .await
        .expect("truncate hostel tables");
    }
}
