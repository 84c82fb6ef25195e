// src/main.rs

//! # AnonCreds Registry - Command Line Entry Point
//!
//! Resolves artifacts from the configured ledger pools and runs revocation
//! reconciliation against exported wallet records.
//!
//! ## Configuration
//! Read from `registry.toml` (or `--config`) and `REGISTRY_*` environment
//! variables, see `config.rs`. `RUST_LOG` overrides `log_level`.
//!
//! ## Commands
//! - `resolve-schema <id>`
//! - `resolve-cred-def <id>`
//! - `resolve-rev-reg <id>`: definition and current status list
//! - `reconcile <rev_reg_id> [--apply] [--records file] [--revoked idx,...]
//!   [--accumulator value] [--genesis file]`: `--revoked` marks loaded records
//!   revoked locally before comparing

use anoncreds_ledger_registry::config::Settings;
use anoncreds_ledger_registry::profile::Profile;
use anoncreds_ledger_registry::registry::{
    fetch_genesis, reconcile_revocation_entry, resolve_credential_definition,
    resolve_revocation_registry_definition, resolve_revocation_status_list, resolve_schema,
};
use anoncreds_ledger_registry::utils::serialization::{read_json_file, serialize_pretty};
use anoncreds_ledger_registry::wallet::{InMemoryWallet, IssuerCredRevRecord};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "anoncreds-registry", version, about = "Legacy ledger AnonCreds registry")]
struct Cli {
    /// Settings file, without extension
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a schema by id
    ResolveSchema { schema_id: String },
    /// Resolve a credential definition by id
    ResolveCredDef { cred_def_id: String },
    /// Resolve a revocation registry definition and its status list
    ResolveRevReg { rev_reg_id: String },
    /// Compare wallet revocation records with the ledger and repair missed entries
    Reconcile {
        rev_reg_id: String,
        /// Submit the corrective entry instead of printing it
        #[arg(long)]
        apply: bool,
        /// JSON array of exported issuer revocation records
        #[arg(long)]
        records: Option<PathBuf>,
        /// Indices to mark revoked in the loaded records
        #[arg(long, value_delimiter = ',')]
        revoked: Vec<u32>,
        /// Accumulator value last recorded by the wallet
        #[arg(long)]
        accumulator: Option<String>,
        /// Genesis transactions file; fetched from the write ledger when omitted
        #[arg(long)]
        genesis: Option<PathBuf>,
    },
}

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load settings (`.env`, config file, environment)
/// 2. Initialize logging
/// 3. Build ledger pools and the wallet view
/// 4. Run the requested command and print its JSON result
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => {
            dotenv::dotenv().ok();
            Settings::load_from(path)?
        }
        None => Settings::load()?,
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    let pools = settings.ledger_pools()?;
    if pools.is_empty() {
        warn!("No ledgers configured; every command will fail");
    }

    let wallet = Arc::new(InMemoryWallet::new());
    if let Command::Reconcile {
        rev_reg_id,
        records,
        revoked,
        accumulator,
        ..
    } = &cli.command
    {
        if let Some(path) = records {
            let records: Vec<IssuerCredRevRecord> = read_json_file(path)?;
            info!("Loaded {} revocation record(s) from {}", records.len(), path.display());
            for record in records {
                wallet.store_record(record).await;
            }
        }
        for cred_rev_id in revoked {
            wallet.mark_revoked(rev_reg_id, *cred_rev_id).await?;
        }
        if let Some(accum) = accumulator {
            wallet.set_accumulator(rev_reg_id, accum.clone()).await;
        }
    }

    let profile = Profile::new("cli", settings, wallet, Arc::new(pools));

    let output = match cli.command {
        Command::ResolveSchema { schema_id } => {
            serialize_pretty(&resolve_schema(&profile, &schema_id).await?)?
        }
        Command::ResolveCredDef { cred_def_id } => {
            serialize_pretty(&resolve_credential_definition(&profile, &cred_def_id).await?)?
        }
        Command::ResolveRevReg { rev_reg_id } => {
            let definition = resolve_revocation_registry_definition(&profile, &rev_reg_id).await?;
            let status_list = resolve_revocation_status_list(&profile, &rev_reg_id).await?;
            serialize_pretty(&json!({
                "definition": definition,
                "statusList": status_list,
            }))?
        }
        Command::Reconcile {
            rev_reg_id,
            apply,
            genesis,
            ..
        } => {
            let genesis = match genesis {
                Some(path) => std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?,
                None => fetch_genesis(&profile).await?,
            };
            let outcome = reconcile_revocation_entry(&profile, &rev_reg_id, apply, &genesis).await?;
            if outcome.is_consistent() {
                info!("Registry {} is consistent with the ledger", rev_reg_id);
            } else if !apply {
                info!("Dry run: {} missed revocation(s) not submitted", outcome.missed.len());
            }
            serialize_pretty(&outcome)?
        }
    };

    println!("{output}");
    Ok(())
}
