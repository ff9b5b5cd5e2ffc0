use chrono::Utc;
use tracing::{debug, warn};

use super::SHOW_TABLES;
use crate::db::{GraphEngine, QueryExecutor};
use crate::errors::GraphMcpError;
use crate::types::{HealthState, HealthStatus};

/// Probes the engine connection and reports its status.
pub struct HealthReporter<'a> {
    executor: QueryExecutor<'a>,
    database_path: &'a str,
    read_only: bool,
}

impl<'a> HealthReporter<'a> {
    /// Creates a reporter for the connection opened at `database_path`.
    pub fn new(engine: &'a dyn GraphEngine, database_path: &'a str, read_only: bool) -> Self {
        Self {
            executor: QueryExecutor::new(engine),
            database_path,
            read_only,
        }
    }

    /// Runs the catalog probe. Never fails: an engine failure is reported
    /// as an `unhealthy` status carrying the engine's message.
    pub fn check(&self) -> HealthStatus {
        let (status, tables_count, error) = match self.executor.execute(SHOW_TABLES) {
            Ok(rows) => {
                debug!(tables = rows.len(), "health probe succeeded");
                (HealthState::Healthy, rows.len(), None)
            }
            Err(e) => {
                warn!(error = %e, "health probe failed");
                let message = match e {
                    GraphMcpError::Engine { message, .. } => message,
                    other => other.to_string(),
                };
                (HealthState::Unhealthy, 0, Some(message))
            }
        };

        HealthStatus {
            status,
            database_path: self.database_path.to_string(),
            read_only: self.read_only,
            tables_count,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            error,
        }
    }
}
