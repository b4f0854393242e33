use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};

use mcp_tool_server::config::Config;
use mcp_tool_server::db::manager::ConnectionManager;
use mcp_tool_server::db::module::DatabaseModule;
use mcp_tool_server::fs::FsModule;
use mcp_tool_server::logging::{self, LogRotation};
use mcp_tool_server::module::Module;
use mcp_tool_server::rpc::kernel::ServerInfo;
use mcp_tool_server::startup::{self, StartupOrchestrator};
use mcp_tool_server::web::WebModule;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// A Model Context Protocol tool server exposing database and web-fetch
/// tools over stdio JSON-RPC.
#[derive(Debug, Parser)]
#[command(styles = STYLES, about = "MCP Tool Server - database and web-fetch tools over stdio")]
struct Args {
    /// The log level for the server (trace, debug, info, warn, error)
    #[arg(long = "log", short = 'l', env = "MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "MCP_LOG_PATH")]
    log_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Stdout carries JSON-RPC responses exclusively; all logging goes to
    // stderr (or a file) so the two streams never interleave.
    let _guard = logging::setup_logging(&args.log_level, args.log_path.clone(), LogRotation::Hourly)?;

    tracing::info!(version = std::env!("CARGO_PKG_VERSION"), "mcp-tool-server starting");

    if let Err(e) = startup::validate_environment() {
        tracing::error!(error = %e, "environment validation failed");
        std::process::exit(1);
    }

    let config = Arc::new(Config::load()?);
    let manager = Arc::new(ConnectionManager::new());

    let orchestrator = StartupOrchestrator::new(
        manager.clone(),
        ServerInfo {
            name: "mcp-tool-server".to_string(),
            version: std::env!("CARGO_PKG_VERSION").to_string(),
        },
    );

    let modules: Vec<Box<dyn Module>> = vec![
        Box::new(DatabaseModule::new(manager.clone(), config.clone())),
        Box::new(WebModule::new(config.clone())),
        Box::new(FsModule),
    ];

    if let Err(e) = orchestrator.load_modules(modules).await {
        tracing::error!(error = %e, "module initialization failed");
        std::process::exit(1);
    }

    if let Err(e) = orchestrator.run().await {
        tracing::error!(error = %e, "server run failed");
        std::process::exit(1);
    }

    Ok(())
}
