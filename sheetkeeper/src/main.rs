//! sheetkeeper - spreadsheet URL metadata keeper
//!
//! `sheetkeeper run` performs one pass and exits; `sheetkeeper serve` runs
//! the HTTP trigger (`POST /run`, `GET /health`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetkeeper::{build_router, AppState, ConfiguredRunner, Runner};
use sheetkeeper_common::config::ServiceConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for sheetkeeper
#[derive(Parser, Debug)]
#[command(name = "sheetkeeper")]
#[command(about = "Fills in titles, durations and upload dates for URLs in spreadsheets")]
#[command(version)]
struct Args {
    /// Path to config file (TOML)
    #[arg(short, long, env = "SHEETKEEPER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Perform one run and exit
    Run,
    /// Serve the HTTP trigger
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "SHEETKEEPER_PORT")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0", env = "SHEETKEEPER_BIND")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise the configured level is applied once loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        revision = env!("SHEETKEEPER_REVISION"),
        built_at = env!("SHEETKEEPER_BUILT_AT"),
        debug_build = cfg!(debug_assertions),
        "Starting sheetkeeper"
    );

    let config = ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if !from_env {
        let level = config.logging.level.clone();
        match EnvFilter::try_new(&level) {
            Ok(configured) => filter_handle
                .modify(|f| *f = configured)
                .context("Failed to apply log level")?,
            Err(e) => error!("Ignoring invalid log level '{}': {}", level, e),
        }
    }

    let runner = Arc::new(ConfiguredRunner::new(config));

    match args.command {
        Command::Run => {
            let report = match runner.run().await {
                Ok(report) => report,
                Err(e) => {
                    error!("Run failed: {}", e);
                    return Err(e).context("Run failed");
                }
            };
            info!(run_id = %report.run_id, sheets = report.sheets.len(), "Run succeeded");
            println!("OK");
        }
        Command::Serve { port, bind } => {
            let app = build_router(AppState::new(runner));

            let addr = format!("{}:{}", bind, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("sheetkeeper listening on http://{}", addr);
            info!("Trigger: POST http://{}/run", addr);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
