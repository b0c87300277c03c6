//! Ledger maintenance utility
//!
//! Commands:
//! - list: Print the review queue in ledger order
//! - audit: Verify every record hash and chain link
//! - reset: Delete the persisted ledger (the upgrade path for format changes)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_store::{Config, LedgerStore};

#[derive(Parser)]
#[command(name = "ledger-admin")]
#[command(about = "Inspect and maintain the violation ledger")]
struct Cli {
    /// Override LEDGER_KEY
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the review queue in ledger order
    List,

    /// Verify every record hash and chain link
    Audit {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the persisted ledger; the next start re-seeds it
    Reset {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(key) = cli.key {
        config.ledger_key = key;
    }

    let backend = config.open_backend().await?;
    // Never seed from the admin tool: an absent ledger stays absent
    let mut ledger = LedgerStore::new(backend, config.ledger_key.clone()).with_seed(false);

    match cli.command {
        Commands::List => {
            if !ledger.load_existing().await.context("Failed to load ledger")? {
                println!("Ledger {} has not been created yet", ledger.key());
            }
            println!("Ledger {} ({} records)", ledger.key(), ledger.list().len());
            for record in ledger.list() {
                println!(
                    "{}  {:<18}  {:<12}  {:>9.2}  {:?}  {}",
                    record.id,
                    format!("{:?}", record.kind),
                    record.vehicle.plate,
                    record.fine_amount,
                    record.status,
                    record.ledger_hash.chars().take(16).collect::<String>(),
                );
            }
        }
        Commands::Audit { json } => {
            if !ledger.load_existing().await.context("Failed to load ledger")? {
                println!("Ledger {} has not been created yet", ledger.key());
            }
            let report = ledger.audit();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} records: {} verified, {} tampered, {} unverified",
                    report.total, report.verified, report.tampered, report.unverified
                );
                for link in &report.broken_links {
                    println!(
                        "  broken link at #{} ({}): prevHash {} != {}",
                        link.position, link.id, link.actual_prev_hash, link.expected_prev_hash
                    );
                }
                println!("Chain intact: {}", report.is_intact());
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset {} without --yes", ledger.key());
            }
            ledger.reset().await.context("Failed to reset ledger")?;
            println!("Ledger {} deleted", ledger.key());
        }
    }

    Ok(())
}
