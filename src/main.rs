use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use sales_leads::config::AppConfig;
use sales_leads::export::{export_list, ExportFormat};
use sales_leads::logging;
use sales_leads::pipeline::storage::SampleRecordStore;
use sales_leads::pipeline::Ingestor;
use sales_leads::server::{start_server, AppState};

#[derive(Parser)]
#[command(name = "sales_leads")]
#[command(about = "Sales-lead list ingestion and outreach text service")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Run the ingestion pipeline on a local file and print the records as JSON
    Ingest {
        /// CSV, XLS or XLSX file
        path: PathBuf,
    },
    /// Write an export of a record list
    Export {
        #[arg(long, default_value = "current")]
        list_id: String,
        /// csv or excel
        #[arg(long, default_value = "csv")]
        format: String,
        /// Output file; defaults to the attachment name in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = logging::init_logging(&config.server.log_dir)
        .with_context(|| format!("creating log directory {}", config.server.log_dir.display()))?;

    match cli.command {
        Commands::Serve => {
            let state = AppState::from_config(config);
            start_server(state)
                .await
                .map_err(|e| anyhow!("server failed: {e}"))?;
        }
        Commands::Ingest { path } => {
            let ingestor = Ingestor::new(&config.ingest);
            match ingestor.ingest_path(&path) {
                Ok(outcome) => {
                    info!("Ingested {} records from {}", outcome.data.len(), path.display());
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                Err(e) => {
                    error!("Ingestion of {} failed: {}", path.display(), e);
                    return Err(e.into());
                }
            }
        }
        Commands::Export { list_id, format, out } => {
            let format: ExportFormat = format.parse()?;
            let file = export_list(&SampleRecordStore, &list_id, format).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(&file.file_name));
            std::fs::write(&out, &file.bytes)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("✅ Wrote {} ({} bytes)", out.display(), file.bytes.len());
        }
    }
    Ok(())
}
