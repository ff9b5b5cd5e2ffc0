//! Startup sequence: open the connection, optionally seed an empty
//! database, then hand a ready [`GraphService`] to the server.
//!
//! ```text
//! Uninitialized --open--> Seeding --seed--> Ready --finish--> GraphService
//! ```
//!
//! Any failure along the way is a [`GraphMcpError::Startup`]; the process
//! must not serve requests after one.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::db::{EngineError, GraphEngine};
use crate::errors::{GraphMcpError, Result};
use crate::graph::SHOW_TABLES;
use crate::service::GraphService;

/// Where startup currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Uninitialized,
    Seeding,
    Ready,
}

impl StartupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartupState::Uninitialized => "uninitialized",
            StartupState::Seeding => "seeding",
            StartupState::Ready => "ready",
        }
    }
}

/// What the seeding step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The database is read-only.
    SkippedReadOnly,
    /// The catalog already has tables.
    SkippedNotEmpty,
    /// No seed script is configured.
    SkippedNoScript,
    /// The script ran; holds the number of statements executed.
    Seeded(usize),
}

/// Drives the startup state machine.
pub struct Bootstrap {
    config: ServerConfig,
    state: StartupState,
    service: Option<GraphService>,
}

impl Bootstrap {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: StartupState::Uninitialized,
            service: None,
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Runs all three steps with the given engine opener.
    pub fn start<F>(config: ServerConfig, opener: F) -> Result<GraphService>
    where
        F: FnOnce(&Path, bool) -> std::result::Result<Box<dyn GraphEngine>, EngineError>,
    {
        let mut bootstrap = Self::new(config);
        bootstrap.open(opener)?;
        bootstrap.seed()?;
        bootstrap.finish()
    }

    /// Opens the single engine connection.
    ///
    /// Creates the parent of the database directory first unless the
    /// database is read-only.
    pub fn open<F>(&mut self, opener: F) -> Result<()>
    where
        F: FnOnce(&Path, bool) -> std::result::Result<Box<dyn GraphEngine>, EngineError>,
    {
        self.expect_state(StartupState::Uninitialized, "open")?;
        let db_path = self.config.db_path.clone();
        let read_only = self.config.read_only;

        if !read_only {
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| GraphMcpError::Startup {
                    message: format!(
                        "failed to create database directory '{}': {e}",
                        parent.display()
                    ),
                })?;
            }
        }

        let engine = opener(&db_path, read_only).map_err(|e| GraphMcpError::Startup {
            message: format!("failed to open database '{}': {e}", db_path.display()),
        })?;

        self.service = Some(GraphService::new(engine, db_path, read_only));
        self.transition(StartupState::Seeding);
        Ok(())
    }

    /// Seeds an empty, writable database from the configured script.
    pub fn seed(&mut self) -> Result<SeedOutcome> {
        self.expect_state(StartupState::Seeding, "seed")?;
        let service = self.service.as_ref().ok_or_else(|| GraphMcpError::Startup {
            message: "no connection to seed".to_string(),
        })?;

        let outcome = if self.config.read_only {
            SeedOutcome::SkippedReadOnly
        } else {
            let tables = service.query(SHOW_TABLES).map_err(|e| GraphMcpError::Startup {
                message: format!("failed to inspect catalog: {e}"),
            })?;
            match (&self.config.seed_file, tables.is_empty()) {
                (_, false) => SeedOutcome::SkippedNotEmpty,
                (None, true) => SeedOutcome::SkippedNoScript,
                (Some(path), true) => SeedOutcome::Seeded(run_seed_script(service, path)?),
            }
        };

        debug!(?outcome, "seeding step complete");
        self.transition(StartupState::Ready);
        Ok(outcome)
    }

    /// Hands out the ready service.
    pub fn finish(mut self) -> Result<GraphService> {
        self.expect_state(StartupState::Ready, "finish")?;
        self.service.take().ok_or_else(|| GraphMcpError::Startup {
            message: "ready without a connection".to_string(),
        })
    }

    fn expect_state(&self, expected: StartupState, step: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GraphMcpError::Startup {
                message: format!(
                    "cannot {step} while {} (expected {})",
                    self.state.as_str(),
                    expected.as_str()
                ),
            })
        }
    }

    fn transition(&mut self, next: StartupState) {
        info!(from = self.state.as_str(), to = next.as_str(), "startup state change");
        self.state = next;
    }
}

fn run_seed_script(service: &GraphService, path: &Path) -> Result<usize> {
    let script = fs::read_to_string(path).map_err(|e| GraphMcpError::Startup {
        message: format!("failed to read seed script '{}': {e}", path.display()),
    })?;

    let statements = split_statements(&script);
    info!(path = %path.display(), statements = statements.len(), "seeding empty database");
    for (index, statement) in statements.iter().enumerate() {
        service.query(statement).map_err(|e| GraphMcpError::Startup {
            message: format!("seed statement {} failed: {e}", index + 1),
        })?;
    }
    Ok(statements.len())
}

/// Splits a Cypher script into statements.
///
/// A statement ends at a line whose last non-blank character is `;`.
/// Lines starting with `//` or `--` are comments.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("--") {
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(trimmed);
        if trimmed.ends_with(';') {
            statements.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        statements.push(current);
    }
    statements
}
