//! Operational entry points: migrations and one-shot scan runs.
//!
//! `run` is the queue-worker/cron boundary — an external scheduler creates a
//! `pending` scan row and invokes `brandlens-cli run --scan <uuid>` to drive
//! it to a terminal state.

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "brandlens-cli")]
#[command(about = "BrandLens command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run a pending scan to its terminal state
    Run {
        /// Public id of the scan to run
        #[arg(long)]
        scan: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = brandlens_core::load_app_config()?;
    let pool_config = brandlens_db::PoolConfig::from_app_config(&config);
    let pool = brandlens_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = brandlens_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Run { scan } => {
            let row = brandlens_db::get_scan_by_public_id(&pool, scan)
                .await?
                .ok_or_else(|| anyhow::anyhow!("scan '{scan}' not found"))?;

            let client = brandlens_backends::BackendClient::from_app_config(&config)?;
            let scan_config = brandlens_scanner::ScanConfig::from_app_config(&config);

            brandlens_scanner::run_scan(&pool, &client, &scan_config, row.id).await?;

            let finished = brandlens_db::get_scan(&pool, row.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("scan '{scan}' disappeared mid-run"))?;
            match finished.overall_score {
                Some(score) => println!("scan {scan}: {} (overall score {score})", finished.status),
                None => println!("scan {scan}: {}", finished.status),
            }
        }
    }

    Ok(())
}
