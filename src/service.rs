use std::path::{Path, PathBuf};

use crate::db::{GraphEngine, QueryExecutor};
use crate::errors::Result;
use crate::graph::{HealthReporter, SchemaReflector};
use crate::types::*;

/// Owns the process-wide engine connection and hands it to each component.
///
/// Built only by [`crate::bootstrap::Bootstrap`] once startup has reached
/// the ready state, or directly by tests over a substitute engine.
pub struct GraphService {
    engine: Box<dyn GraphEngine>,
    db_path: PathBuf,
    read_only: bool,
}

impl std::fmt::Debug for GraphService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphService")
            .field("db_path", &self.db_path)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl GraphService {
    pub fn new(engine: Box<dyn GraphEngine>, db_path: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            engine,
            db_path: db_path.into(),
            read_only,
        }
    }

    /// Executes a Cypher statement and returns all rows.
    pub fn query(&self, statement: &str) -> Result<Vec<Row>> {
        QueryExecutor::new(self.engine.as_ref()).execute(statement)
    }

    /// Reflects the live schema.
    pub fn schema(&self) -> Result<GraphSchema> {
        SchemaReflector::new(self.engine.as_ref()).reflect()
    }

    /// Checks the connection. Always returns a status record.
    pub fn health(&self) -> HealthStatus {
        let path = self.db_path.to_string_lossy();
        HealthReporter::new(self.engine.as_ref(), &path, self.read_only).check()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}
