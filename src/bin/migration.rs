use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use invoice_store::{config, db, schema, seed};

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Manage the invoice store schema")]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up,
    /// Show applied and pending migrations
    Status,
    /// Drop invoices and items, then rebuild the schema
    Reset {
        /// Confirm that all invoice data may be destroyed
        #[arg(long)]
        yes: bool,
    },
    /// Insert demo invoices that are not already present
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("Connecting to database: {}", cfg.database_url());
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            let applied = schema::migrate(&pool).await?;
            info!("Applied {} migration(s)", applied);
        }
        Command::Status => {
            for migration in schema::status(&pool).await? {
                let state = if migration.applied { "applied" } else { "pending" };
                println!("{:<8} {}", state, migration.name);
            }
        }
        Command::Reset { yes } => {
            let confirmation = schema::ResetConfirmation::resolve(yes, &cfg).map_err(|e| {
                error!("Refusing to reset without --yes");
                e
            })?;
            schema::reset(&pool, confirmation).await?;
            info!("Database reset with empty invoices and items tables");
        }
        Command::Seed => {
            schema::migrate(&pool).await?;
            let inserted = seed::seed_demo_data(Arc::new(pool.clone()), &cfg).await?;
            info!("Inserted {} demo invoice(s)", inserted);
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}
