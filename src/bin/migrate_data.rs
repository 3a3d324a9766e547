//! One-time migration of the PostgreSQL `users` table to DynamoDB.
//!
//! Usage:
//!   migrate-data [--dry-run]
//!
//! Add --dry-run to transform every user without writing to DynamoDB.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use lunari_user_etl::pipeline;
use lunari_user_etl::source::UserSource;
use lunari_user_etl::storage::{writer_for, DynamoDBStore};
use lunari_user_etl::utils::{self, Config, LogFormat};

#[derive(Parser)]
#[command(name = "migrate-data")]
#[command(version)]
#[command(about = "Migrate users from PostgreSQL to DynamoDB", long_about = None)]
struct Cli {
    /// Run without writing to DynamoDB
    #[arg(long)]
    dry_run: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_logging(cli.log_format);

    tokio::select! {
        result = migrate_data(cli.dry_run) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Migration interrupted by user");
            ExitCode::FAILURE
        }
    }
}

async fn migrate_data(dry_run: bool) -> Result<()> {
    info!("{}", "=".repeat(60));
    info!("Starting Data Migration: PostgreSQL → DynamoDB");
    info!("{}", "=".repeat(60));

    if dry_run {
        warn!("DRY RUN MODE - No data will be written to DynamoDB");
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    let source = UserSource::connect(&config.postgres_options())
        .await
        .context("✗ Failed to connect to PostgreSQL")?;

    let store = DynamoDBStore::new(&config, config.dynamodb_table_name.clone()).await;
    info!("Target table: {}", store.table_name());

    let writer = writer_for(dry_run, Box::new(store));
    let stats = pipeline::run_migration(source, writer.as_ref())
        .await
        .context("Error during migration")?;

    stats.log_summary("Migration Summary");

    if dry_run {
        warn!("DRY RUN - No data was written to DynamoDB");
    } else {
        info!("✓ Migration completed successfully!");
    }

    Ok(())
}
