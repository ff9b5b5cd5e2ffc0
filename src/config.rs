use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{GraphMcpError, Result};

/// Name of the application directory under the platform data directory.
pub const APP_DIR: &str = "kuzu-mcp";

/// Environment variable overriding the database directory.
pub const ENV_DB_PATH: &str = "KUZU_MCP_DB_PATH";

/// Environment variable enabling read-only mode.
pub const ENV_READ_ONLY: &str = "KUZU_MCP_READ_ONLY";

/// Environment variable pointing at a Cypher seed script.
pub const ENV_SEED_FILE: &str = "KUZU_MCP_SEED_FILE";

/// Configuration the server receives from the launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory of the Kùzu database.
    pub db_path: PathBuf,
    /// Open the database read-only; disables seeding.
    pub read_only: bool,
    /// Cypher script run once when a writable database starts out empty.
    pub seed_file: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            read_only: false,
            seed_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// Returns `<data dir>/kuzu-mcp/database`, or a path relative to the
/// working directory when the platform has no data directory.
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR).join("database"),
        None => PathBuf::from(format!("{APP_DIR}-data")).join("database"),
    }
}

/// Loads the configuration from a TOML file. Fields absent from the file
/// keep their defaults.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    let contents = fs::read_to_string(path).map_err(|e| GraphMcpError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    toml::from_str(&contents).map_err(|e| GraphMcpError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })
}

/// Saves the configuration as TOML using an atomic write.
pub fn save_config(path: &Path, config: &ServerConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GraphMcpError::Config {
            message: format!(
                "failed to create config directory '{}': {}",
                parent.display(),
                e
            ),
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|e| GraphMcpError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(|e| GraphMcpError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, path).map_err(|e| GraphMcpError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            path.display(),
            e
        ),
    })
}

/// Applies environment overrides, reading variables through `lookup`
/// (`|k| std::env::var(k).ok()` for the process environment).
pub fn apply_env<F>(config: &mut ServerConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
        config.db_path = PathBuf::from(path);
    }
    if let Some(value) = lookup(ENV_READ_ONLY) {
        config.read_only = parse_flag(ENV_READ_ONLY, &value)?;
    }
    if let Some(path) = lookup(ENV_SEED_FILE).filter(|p| !p.trim().is_empty()) {
        config.seed_file = Some(PathBuf::from(path));
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(GraphMcpError::Config {
            message: format!("invalid boolean for {name}: '{other}'"),
        }),
    }
}
