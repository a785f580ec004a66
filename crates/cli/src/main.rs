mod cli;
mod logging;
mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use media_hygiene_core::config::CONFIG_ENV_VAR;
use media_hygiene_core::report::{read_lookup_input, write_lost, write_low_quality, write_table};
use media_hygiene_core::{
    load_config, load_layered_config, scan_library, validate_config, Config, LookupPipeline,
    ScanRules, TracingObserver, YtsClient,
};

use cli::{Cli, Command, LookupArgs, ScanArgs};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = load(cli.config.clone())?;

    match &cli.command {
        Command::Scan(args) => {
            args.apply(&mut config);
            validate_config(&config).context("Configuration validation failed")?;
            scan(args, &config)?;
        }
        Command::Lookup(args) => {
            args.apply(&mut config);
            validate_config(&config).context("Configuration validation failed")?;
            lookup(args, &config, cli.verbose).await?;
        }
    }

    if let Some(path) = &cli.metrics_file {
        std::fs::write(path, metrics::encode_metrics())
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics written to {:?}", path);
    }

    Ok(())
}

/// `--config`, then `$MEDIA_HYGIENE_CONFIG`, then defaults and environment only.
fn load(path: Option<PathBuf>) -> Result<Config> {
    let path = path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_layered_config(None).context("Failed to load configuration"),
    }
}

fn scan(args: &ScanArgs, config: &Config) -> Result<()> {
    let rules = ScanRules::from_config(&config.scan);
    info!(root = ?args.root, tiny_mib = rules.tiny_mib(), "Scanning library");

    let report = scan_library(&args.root, &rules)
        .with_context(|| format!("Failed to scan {:?}", args.root))?;

    let low_quality_path = config.output.low_quality_path();
    let lost_path = config.output.lost_path();
    write_low_quality(&low_quality_path, &report.low_quality)
        .with_context(|| format!("Failed to write {:?}", low_quality_path))?;
    write_lost(&lost_path, &report.lost)
        .with_context(|| format!("Failed to write {:?}", lost_path))?;

    if !report.warnings.is_empty() {
        warn!("{} paths could not be read", report.warnings.len());
    }
    info!(
        directories = report.stats.directories,
        files = report.stats.files,
        videos = report.stats.video_files,
        pruned = report.stats.pruned_directories,
        "Scan complete"
    );
    info!(
        "{} low-quality files -> {:?}",
        report.low_quality.len(),
        low_quality_path
    );
    info!("{} lost folders -> {:?}", report.lost.len(), lost_path);
    Ok(())
}

async fn lookup(args: &LookupArgs, config: &Config, verbose: bool) -> Result<()> {
    let mut table = read_lookup_input(&args.from_csv)
        .with_context(|| format!("Failed to read {:?}", args.from_csv))?;

    let client = YtsClient::new(&config.catalog).context("Failed to create catalog client")?;
    let years = ScanRules::from_config(&config.scan).years();
    let pipeline = LookupPipeline::from_config(Arc::new(client), &config.lookup)
        .with_observer(Arc::new(TracingObserver::new(verbose)))
        .with_years(years);

    info!(
        rows = table.len(),
        concurrency = pipeline.concurrency(),
        rate_limited = pipeline.is_rate_limited(),
        "Looking up {:?} against {}",
        args.from_csv,
        config.catalog.base_url
    );

    let summary = pipeline.enrich(&mut table).await;

    let output = args.output_path();
    write_table(&output, &table).with_context(|| format!("Failed to write {:?}", output))?;

    info!(
        matched = summary.matched,
        no_match = summary.no_match,
        failed = summary.failed,
        skipped = summary.skipped,
        "Lookup complete -> {:?}",
        output
    );
    Ok(())
}
