//! Populates the `lunari-users-<env>` DynamoDB table with sample client data.
//!
//! Usage:
//!   seed-database [ENV] [--seed-file FILE]
//!
//! Exits 0 once every entry was attempted (even if some failed), 1 when the
//! table or the seed file is missing, or on Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use lunari_user_etl::pipeline;
use lunari_user_etl::source::{load_seed_file, DEFAULT_SEED_FILE};
use lunari_user_etl::storage::DynamoDBStore;
use lunari_user_etl::utils::{self, Config, LogFormat};

#[derive(Parser)]
#[command(name = "seed-database")]
#[command(version)]
#[command(about = "Insert sample users into the LUNARi users table", long_about = None)]
struct Cli {
    /// Environment name; the target table is lunari-users-<ENV>
    #[arg(default_value = "dev")]
    env: String,

    /// JSON array of pre-shaped user items
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SEED_FILE)]
    seed_file: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_logging(cli.log_format);

    tokio::select! {
        result = seed_database(cli) => match result {
            Ok(()) => {
                info!("Done!");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("ERROR: {err:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Aborted by user");
            ExitCode::FAILURE
        }
    }
}

async fn seed_database(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let table_name = Config::seed_table_name(&cli.env);

    info!("{}", "=".repeat(40));
    info!("  DynamoDB Seed Script - LUNARi Users");
    info!("{}", "=".repeat(40));
    info!("Environment: {}", cli.env);
    info!("Table Name: {}", table_name);
    info!("Region: {}", config.aws_region);

    let store = DynamoDBStore::new(&config, table_name).await;

    info!("Checking if table exists...");
    store
        .ensure_table()
        .await
        .with_context(|| format!("Create the table first for environment '{}'", cli.env))?;
    info!("✓ Table exists");

    info!("Loading seed data...");
    let entries = load_seed_file(&cli.seed_file)?;
    info!(
        "✓ Loaded {} users from {}",
        entries.len(),
        cli.seed_file.display()
    );

    info!("Inserting users into DynamoDB...");
    let stats = pipeline::seed_users(entries, &store).await;
    stats.log_summary("Summary");

    if stats.succeeded > 0 {
        info!("✓ Database seeded successfully!");
        info!(
            "Query the data with: aws dynamodb scan --table-name {} --region {}",
            store.table_name(),
            config.aws_region
        );
    }

    Ok(())
}
