mod check_cmd;
mod config;
mod config_cmd;
mod db_cmd;
mod status_cmd;
mod terminal_output;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use idguard_config::{config_dir, config_file_path, load_and_prepare, IdGuardConfig};
use idguard_gateway::{start_server, GatewayState, UploadSettings};
use idguard_logging::init_logger;

use terminal_output::note_error;

#[derive(Parser)]
#[command(name = "idguard")]
#[command(about = "IdGuard: identity document fraud check")]
#[command(version)]
struct Cli {
    /// Path to idguard.yaml (defaults to ./idguard.yaml or ~/.idguard/idguard.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the record database and schema if missing
    InitDb,
    /// List stored identity records, newest first
    Records {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Show only the last four digits of identity numbers
        #[arg(long)]
        mask: bool,
    },
    /// Run the workflow once against an image file
    Check {
        image: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show whether a local server is running
    Status,
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let _log_guard = init_logger(
        config.log_dir().as_deref(),
        &config.log_level(),
        config.log_json(),
    )?;
    for warning in idguard_config::validate(&config).warnings {
        tracing::warn!(path = %warning.path, "{}", warning.message);
    }

    match cli.command {
        Commands::Serve { port } => run_server(config, port).await?,
        Commands::InitDb => db_cmd::init_db(&config).await?,
        Commands::Records { limit, mask } => db_cmd::records(&config, limit, mask).await?,
        Commands::Check { image, json } => {
            // `_log_guard` must drop before the process exits to flush file logs.
            let status = check_cmd::run(&config, &image, json).await?;
            return Ok(ExitCode::from(check_cmd::exit_code(status)));
        }
        Commands::Status => status_cmd::run(&config).await?,
        Commands::Config => config_cmd::run(&config)?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_server(config: IdGuardConfig, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or_else(|| config.port());
    let addr: SocketAddr = format!("{}:{}", config.bind(), port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind(), port))?;

    let orchestrator = match config::build_orchestrator(&config) {
        Ok(o) => o,
        Err(e) => {
            note_error(&format!("{e:#}"));
            return Err(e);
        }
    };
    info!(
        addr = %addr,
        db = %config.database_path().display(),
        policy = %orchestrator.policy(),
        "Starting IdGuard"
    );

    let uploads = UploadSettings {
        max_bytes: config.max_upload_bytes(),
        keep_dir: config.keep_uploads().then(|| config.upload_dir()),
    };
    let state = GatewayState::new(Arc::new(orchestrator), uploads);
    start_server(addr, state).await
}
