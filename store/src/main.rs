//! Maintenance tool for a PromptVerse store file.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use promptverse_store::{FixtureLocation, Store, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(name = "promptverse-admin")]
#[clap(about = "Seed, inspect and repair a PromptVerse store")]
struct Args {
    /// SQLite database file (can also be set via DATABASE_URL)
    #[clap(long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Fixture directory, base URL, or `none` (can also be set via FIXTURES)
    #[clap(long, env = "FIXTURES")]
    fixtures: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed any collection that has never been stored
    Init,
    /// Report counters that disagree with the records they summarize
    Audit {
        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },
    /// Rewrite drifted counters
    Repair,
    /// Delete comments, outputs, favorites and votes whose target is gone
    PurgeOrphans,
    /// Print the number of records in each collection
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptverse_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = StoreConfig::from_env();
    if let Some(database) = args.database {
        config.database_url = database;
    }
    if let Some(fixtures) = args.fixtures.as_deref() {
        config.fixtures = FixtureLocation::parse(fixtures);
    }

    let store = Store::open(&config)?;
    store.initialize().await?;

    match args.command {
        Command::Init => {
            println!("Store ready at {}", config.database_url);
        }
        Command::Audit { json } => {
            let report = store.audit_counters().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for drift in &report.drifts {
                    println!(
                        "{} {} {}: stored {}, actual {}",
                        drift.entity, drift.id, drift.field, drift.stored, drift.actual
                    );
                }
            }
            if !report.is_clean() {
                bail!("{} counter(s) out of step", report.drifts.len());
            }
            if !json {
                println!("All counters consistent");
            }
        }
        Command::Repair => {
            let report = store.repair_counters().await?;
            println!("Repaired {} counter(s)", report.drifts.len());
        }
        Command::PurgeOrphans => {
            let report = store.purge_orphans().await?;
            if report.total() == 0 {
                println!("Nothing to purge");
                return Ok(());
            }
            println!(
                "Removed {} comment(s), {} output(s), {} favorite(s), {} vote(s)",
                report.comments, report.outputs, report.favorites, report.votes
            );
        }
        Command::Stats => {
            for (collection, count) in store.stats().await {
                println!("{:<12} {count}", collection.name());
            }
        }
    }

    Ok(())
}
