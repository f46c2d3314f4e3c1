mod config;
mod db;
mod errors;
mod models;
mod records;
mod routes;
mod state;
mod stats;
mod transfer;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transfer::export::export_to_dir;
use crate::transfer::import::{run_import, ImportMode, ImportOptions, ImportSources, KeyStrategy};

#[derive(Parser)]
#[command(name = "reverse-ats")]
#[command(about = "Job application tracker: HTTP service and CSV import/export")]
struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Port to listen on (overrides REVERSE_ATS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Import all five CSV files from a directory, stopping at the first failure
    Import {
        /// Directory holding the `reverse-ats - <Entity>.csv` files
        #[arg(short, long)]
        dir: PathBuf,

        /// Keep the identifiers from the files instead of assigning new ones
        #[arg(long)]
        preserve_ids: bool,
    },

    /// Write all five tables as CSV files into a directory
    Export {
        /// Output directory, created if missing
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Commands::Import { dir, preserve_ids } => import(config, dir, preserve_ids).await,
        Commands::Export { dir } => export(config, dir).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting reverse-ats v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    let state = AppState {
        db,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn import(config: Config, dir: PathBuf, preserve_ids: bool) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let sources = ImportSources::from_dir(&dir);
    if sources.is_empty() {
        bail!("No reverse-ats CSV files found in {}", dir.display());
    }
    let db = create_pool(&config.database_url).await?;
    let options = ImportOptions {
        mode: ImportMode::Strict,
        keys: if preserve_ids {
            KeyStrategy::Preserve
        } else {
            KeyStrategy::Remap
        },
        salary: config.salary_policy,
    };

    let report = run_import(&db, &sources, options).await;
    for step in &report.steps {
        info!(
            "{}: {} imported, {} skipped",
            step.entity, step.imported, step.skipped
        );
    }
    if let Some(failure) = report.failures.first() {
        for failure in &report.failures {
            error!("{failure}");
        }
        bail!("Import stopped: {failure}");
    }

    info!("Import complete: {} row(s)", report.imported());
    Ok(())
}

async fn export(config: Config, dir: PathBuf) -> Result<()> {
    let db = create_pool(&config.database_url).await?;
    let written = export_to_dir(&db, &dir)
        .await
        .with_context(|| format!("Failed to export into {}", dir.display()))?;
    info!("Wrote {} file(s) to {}", written.len(), dir.display());
    Ok(())
}
