use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::info;

mod config;
mod details;
mod discovery;
mod domain;
mod error;
mod export;
mod harvester;
mod infer;
mod landmarks;
mod model;
mod models;
mod ranker;
mod relay;
mod scanner;
mod scope;
mod session;
mod store;
mod surface;
mod validator;

use crate::discovery::EmailDiscovery;
use crate::model::ModelClient;
use crate::relay::RelayClient;
use crate::session::SessionContext;
use crate::store::ResultStore;
use crate::surface::{ListingSurface, SnapshotFile};

#[derive(Parser)]
#[command(author, version, about = "Scrapes business listings from map-search snapshots and discovers their contact emails", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: config::CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scraping session over every listing snapshot in a directory
    Run {
        /// Directory of captured listing pages (*.html)
        #[arg(short, long)]
        input: PathBuf,

        /// Path of the JSON result store
        #[arg(short, long, default_value = "results.json")]
        store: PathBuf,
    },
    /// Run the discovery pipeline for a single snapshot and print JSON
    Probe {
        /// Path of one captured listing page
        #[arg(short, long)]
        input: PathBuf,

        /// Business name override when the snapshot has no usable title
        #[arg(long)]
        name: Option<String>,

        /// Website override for the inference and fetch states
        #[arg(long)]
        website: Option<String>,
    },
    /// Export the result store as CSV
    Export {
        /// Path of the JSON result store
        #[arg(short, long, default_value = "results.json")]
        store: PathBuf,

        /// Path of the CSV file to write
        #[arg(short, long, default_value = "leads.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::build_config(&cli.common)?;

    match cli.command {
        Commands::Run { input, store } => run_cmd(cfg, input, store).await,
        Commands::Probe {
            input,
            name,
            website,
        } => probe_cmd(cfg, input, name, website).await,
        Commands::Export { store, output } => export_cmd(store, output),
    }
}

fn build_engine(cfg: &config::Config) -> Result<EmailDiscovery> {
    let http = reqwest::Client::builder()
        .user_agent(&cfg.user_agent)
        .timeout(cfg.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let relay = RelayClient::new(http.clone(), cfg.relay_endpoints.clone());
    let model = ModelClient::new(
        http,
        cfg.model_endpoint.clone(),
        cfg.model_name.clone(),
        cfg.api_key.clone(),
    );
    Ok(EmailDiscovery::new(
        relay,
        model,
        cfg.settings.clone(),
        cfg.settle_delay,
    ))
}

async fn run_cmd(cfg: config::Config, input: PathBuf, store_path: PathBuf) -> Result<()> {
    let surfaces = collect_snapshots(&input)?;
    info!(
        "Processing {} listing snapshots from {}",
        surfaces.len(),
        input.display()
    );

    let engine = build_engine(&cfg)?;
    let mut store = ResultStore::open(&store_path)?;
    let mut ctx = SessionContext::new(cfg.settings.clone());

    // Ctrl-C clears the active flag; the session exits at its next
    // checkpoint without aborting the listing in flight.
    let cancel = ctx.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping at the next checkpoint");
            cancel.store(false, Ordering::SeqCst);
        }
    });

    let progress = indicatif::ProgressBar::new(surfaces.len() as u64);
    progress.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let report =
        session::run_session(&mut ctx, surfaces, &engine, &mut store, Some(&progress)).await?;
    progress.finish_with_message("Session complete");

    let stats = store.stats();
    info!(
        "Scraped {} new listings ({} duplicates, {} failed). Emails so far: {} ({} direct, {} website, {} ai, {} inferred).",
        report.scraped,
        report.duplicates,
        report.failed,
        stats.total(),
        stats.direct,
        stats.website,
        stats.ai,
        stats.inferred
    );
    info!("Results written to {}", store.path().display());
    Ok(())
}

async fn probe_cmd(
    cfg: config::Config,
    input: PathBuf,
    name: Option<String>,
    website: Option<String>,
) -> Result<()> {
    let engine = build_engine(&cfg)?;
    let mut surface = SnapshotFile::new(&input);

    let (mut listing, self_email) = {
        let doc = surface.snapshot()?;
        (
            details::extract_details(&doc),
            harvester::detect_operator_email(&doc),
        )
    };
    if let Some(name) = name {
        listing.name = name;
    }
    if let Some(website) = website {
        listing.website = Some(website);
    }
    if listing.name.is_empty() {
        anyhow::bail!(
            "Snapshot {} has no business name; pass one with --name",
            input.display()
        );
    }

    let validator = validator::EmailValidator::new(self_email);
    let found = engine.discover(&mut surface, &listing, &validator).await?;
    let contact_links = found.contact_links.clone();
    let record = session::build_record(listing, found);

    let output = serde_json::json!({
        "record": record,
        "contact_links": contact_links,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn export_cmd(store_path: PathBuf, output: PathBuf) -> Result<()> {
    let store = ResultStore::open(&store_path)?;
    export::export_csv(store.records(), &output)?;
    info!(
        "Exported {} records to {}",
        store.records().len(),
        output.display()
    );
    Ok(())
}

/// Collects every *.html / *.htm file in the input directory, sorted by
/// name so sessions are repeatable.
fn collect_snapshots(input: &std::path::Path) -> Result<Vec<SnapshotFile>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("Cannot read snapshot directory {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        })
        .collect();
    paths.sort();
    Ok(paths.into_iter().map(SnapshotFile::new).collect())
}
