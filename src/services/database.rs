//! Database service: wraps the SQLite pool for lifecycle (start/stop/health).
//!
//! Other services that need the tables should declare `dependencies: ["database"]`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::query;
use tracing::{info, warn};

use crate::db::Database;
use crate::services::manager::{Service, ServiceHealth};

/// Service that owns the database pool and provides start/stop/health.
pub struct DatabaseService {
    pool: Database,
}

impl DatabaseService {
    /// Create a new database service with an already-connected pool.
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Service for DatabaseService {
    fn name(&self) -> &str {
        "database"
    }

    async fn start(&self) -> Result<()> {
        info!(service = "database", "Database service starting");
        query("SELECT 1").execute(self.pool.pool()).await?;

        let sync_result = self.pool.migrate().await?;
        if !sync_result.tables_created.is_empty() {
            info!(
                service = "database",
                tables = ?sync_result.tables_created,
                "Created tables"
            );
        }

        info!(service = "database", "Database service started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.pool.close().await;
        info!(service = "database", "Database service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match query("SELECT 1").execute(self.pool.pool()).await {
            Ok(_) => Ok(ServiceHealth::healthy()),
            Err(e) => {
                warn!(service = "database", error = %e, "Health check failed");
                Ok(ServiceHealth::unhealthy(e.to_string()))
            }
        }
    }
}
