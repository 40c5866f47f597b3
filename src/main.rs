//! breeder-match CLI - on-demand refresh and scheduled resync of plan suggestions
//!
//! Every subcommand prints its result as JSON on stdout.

use std::process::ExitCode;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validate;
use breeder_match::config::{LoggingSettings, Settings};
use breeder_match::core::{Matcher, Reconciler};
use breeder_match::models::{DbId, MatchPreviewResponse, RefreshEntriesRequest, RefreshPlanRequest};
use breeder_match::services::{PostgresClient, WaitlistReader};

/// Waitlist-to-breeding-plan match maintenance
#[derive(Parser)]
#[command(name = "breeder-match")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/default + config/local)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked candidate set for a plan without writing anything
    Preview {
        #[arg(long)]
        tenant: DbId,
        #[arg(long)]
        plan: DbId,
    },

    /// Reconcile the stored suggestions of one plan
    RefreshPlan {
        #[arg(long)]
        tenant: DbId,
        #[arg(long)]
        plan: DbId,
    },

    /// Reconcile every plan a changed waitlist entry can affect
    RefreshEntry {
        #[arg(long)]
        tenant: DbId,
        #[arg(long)]
        entry: DbId,
    },

    /// Reconcile every plan touched by a set of changed waitlist entries
    RefreshEntries {
        #[arg(long)]
        tenant: DbId,
        #[arg(long, value_delimiter = ',', required = true)]
        entries: Vec<DbId>,
    },

    /// Re-derive the suggestions of every plan reachable from the tenant's eligible entries
    Resync {
        #[arg(long)]
        tenant: DbId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging);

    match run(cli.command, &settings).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn run(command: Commands, settings: &Settings) -> Result<String, Box<dyn std::error::Error>> {
    let postgres = Arc::new(PostgresClient::from_settings(&settings.database).await?);
    let weights = settings.scoring_weights();
    info!("Matcher initialized with weights: {:?}", weights);
    let reconciler = Reconciler::new(postgres, Matcher::new(weights));

    let output = match command {
        Commands::Preview { tenant, plan } => {
            RefreshPlanRequest { tenant_id: tenant, plan_id: plan }.validate()?;
            let matches = reconciler.find_possible_matches(plan, tenant).await?;
            serde_json::to_string_pretty(&MatchPreviewResponse::new(tenant, plan, matches))?
        }
        Commands::RefreshPlan { tenant, plan } => {
            RefreshPlanRequest { tenant_id: tenant, plan_id: plan }.validate()?;
            let summary = reconciler.refresh_plan_matches(plan, tenant).await?;
            info!(tenant_id = tenant, plan_id = plan, added = summary.added, removed = summary.removed, updated = summary.updated, "Plan refreshed");
            serde_json::to_string_pretty(&summary)?
        }
        Commands::RefreshEntry { tenant, entry } => {
            RefreshEntriesRequest { tenant_id: tenant, entry_ids: vec![entry] }.validate()?;
            reconciler.refresh_matching_plans_for_entry(entry, tenant).await?;
            serde_json::json!({ "tenantId": tenant, "entryId": entry, "refreshed": true }).to_string()
        }
        Commands::RefreshEntries { tenant, entries } => {
            let request = RefreshEntriesRequest { tenant_id: tenant, entry_ids: entries };
            request.validate()?;
            let summary = reconciler
                .refresh_matching_plans_for_entries(&request.entry_ids, request.tenant_id)
                .await?;
            serde_json::to_string_pretty(&summary)?
        }
        Commands::Resync { tenant } => {
            let entry_ids: Vec<DbId> = reconciler
                .store()
                .eligible_entries(tenant)
                .await?
                .into_iter()
                .map(|e| e.id)
                .collect();
            info!(tenant_id = tenant, entries = entry_ids.len(), "Starting tenant resync");
            let summary = reconciler.refresh_matching_plans_for_entries(&entry_ids, tenant).await?;
            serde_json::to_string_pretty(&summary)?
        }
    };

    Ok(output)
}
