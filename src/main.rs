use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use kuzu_mcp::bootstrap::Bootstrap;
use kuzu_mcp::config::{apply_env, load_config, ServerConfig};
use kuzu_mcp::db::{GraphEngine, KuzuEngine};
use kuzu_mcp::errors::Result;
use kuzu_mcp::mcp::McpServer;
use kuzu_mcp::service::GraphService;
use kuzu_mcp::types::HealthState;
use tracing_subscriber::EnvFilter;

/// MCP server for an embedded Kùzu graph database.
#[derive(Parser)]
#[command(name = "kuzu-mcp", version, about = "MCP server for an embedded Kùzu graph database")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Database directory (overrides config and KUZU_MCP_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    /// Open the database read-only
    #[arg(long, global = true)]
    read_only: bool,
    /// Cypher script used to seed an empty database
    #[arg(long, global = true)]
    seed_file: Option<PathBuf>,
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,
    /// Print the reflected schema as JSON
    Schema,
    /// Print a health report as JSON; exits 1 when unhealthy
    Health,
    /// Run one Cypher statement and print the rows as JSON
    Query {
        /// Cypher statement
        cypher: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    init_tracing(&config.log_level);

    let service = Bootstrap::start(config, |path, read_only| {
        KuzuEngine::open(path, read_only).map(|engine| Box::new(engine) as Box<dyn GraphEngine>)
    })?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let server = McpServer::new(service)?;
            server.run().await?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&service.schema()?)?);
        }
        Commands::Health => {
            let health = service.health();
            println!("{}", serde_json::to_string_pretty(&health)?);
            if health.status == HealthState::Unhealthy {
                process::exit(1);
            }
        }
        Commands::Query { cypher } => print_rows(&service, &cypher)?,
    }
    Ok(())
}

fn print_rows(service: &GraphService, cypher: &str) -> Result<()> {
    let rows = service.query(cypher)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Layers configuration: defaults, then the config file, then the
/// environment, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok())?;

    if let Some(path) = &cli.db_path {
        config.db_path = path.clone();
    }
    if cli.read_only {
        config.read_only = true;
    }
    if let Some(path) = &cli.seed_file {
        config.seed_file = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kuzu_mcp={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
