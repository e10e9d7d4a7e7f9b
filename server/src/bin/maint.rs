//! Wayfarer database maintenance
//!
//! Manual, one-shot commands for operators. Everything here is read-only
//! except `migrate` and `sweep-presence`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::info;

use wayfarer_server::db;

#[derive(Parser, Debug)]
#[command(name = "wayfarer-maint")]
#[command(about = "Wayfarer database maintenance commands", long_about = None)]
struct Args {
    /// Database URL (postgres://… or sqlite:…)
    #[arg(long, env = "WF_DATABASE_URL", default_value = "sqlite://./data/wayfarer.db")]
    database_url: String,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables and indexes
    Migrate,
    /// List indexes, optionally for one table
    Indexes {
        #[arg(long)]
        table: Option<String>,
    },
    /// List the constraints declared on a table
    Constraints { table: String },
    /// Mark users with stale heartbeats offline
    SweepPresence {
        #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u32).range(1..=db::MAX_PRESENCE_TTL_SECS))]
        ttl: u32,
    },
    /// Deprecated: slug checks were removed along with username slugs
    SlugCheck,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,wayfarer_server=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Command::SlugCheck = args.command {
        println!("slug-check is deprecated: slug checks were removed; profiles are addressed by public id");
        return Ok(());
    }

    let backend = db::open(&args.database_url, 1, Duration::from_secs(10))
        .await
        .with_context(|| format!("failed to open {}", args.database_url))?;

    match args.command {
        Command::Migrate => {
            backend.run_migrations().await?;
            println!("migrations applied");
        }
        Command::Indexes { table } => {
            let indexes = backend.list_indexes(table.as_deref()).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&indexes)?);
            } else if indexes.is_empty() {
                println!("no indexes found");
            } else {
                for index in indexes {
                    println!("{}\t{}\t{}", index.table, index.name, index.definition.unwrap_or_default());
                }
            }
        }
        Command::Constraints { table } => {
            let constraints = backend.list_constraints(&table).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&constraints)?);
            } else if constraints.is_empty() {
                println!("no constraints on {}", table);
            } else {
                for c in constraints {
                    println!("{}\t{}\t{}", c.name, c.kind, c.detail.unwrap_or_default());
                }
            }
        }
        Command::SweepPresence { ttl } => {
            let flipped = backend.mark_stale_offline(i64::from(ttl)).await?;
            info!("sweep-presence: ttl={}s", ttl);
            println!("marked {} users offline", flipped);
        }
        Command::SlugCheck => {}
    }

    backend.close().await;
    Ok(())
}
