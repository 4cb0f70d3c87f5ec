//! # story_digest
//!
//! Command-line front end: load collector output, run the digest pipeline
//! and write the dated `digest.json`.
//!
//! ## Usage
//!
//! ```sh
//! story_digest -i google_news.xml -i industry.json -o ./digest -c digest.yaml
//! story_digest -o ./digest -c digest.yaml --query 아큐브
//! ```
//!
//! ## Steps
//!
//! 1. **Configuration**: YAML file (optional) plus CLI overrides
//! 2. **Loading**: files read and feeds fetched concurrently, failures skipped
//! 3. **Pipeline**: dates, filters, clustering, partitioning, suppression
//! 4. **Output**: `{output_dir}/{anchor_date}/digest.json`

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use story_digest::DigestError;
use story_digest::config::DigestConfig;
use story_digest::ingest::fetch::{HttpFetcher, RetryFetch, configured_feed_urls};
use story_digest::ingest::{load_feeds, load_inputs};
use story_digest::outputs::json::write_digest;
use story_digest::pipeline::run_pipeline;
use story_digest::utils::ensure_writable_dir;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("story_digest starting up");

    let args = Cli::parse();
    debug!(inputs = ?args.inputs, output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => match DigestConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load configuration");
                return Err(e.into());
            }
        },
        None => {
            info!("No configuration file given; using defaults");
            DigestConfig::default()
        }
    };
    if let Some(threshold) = args.threshold {
        config.clustering.similarity_threshold = threshold;
    }
    if let Some(anchor) = args.anchor {
        config.anchor.instant = Some(anchor);
    }
    config.feeds.urls.extend(args.feeds.iter().cloned());
    config.feeds.google_news_queries.extend(args.queries.iter().cloned());
    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration rejected");
        return Err(e.into());
    }
    let feed_urls = configured_feed_urls(&config.feeds);
    if args.inputs.is_empty() && feed_urls.is_empty() {
        error!("Nothing to digest: give --input files or configure feeds");
        return Err(DigestError::Config("no input files or feeds".to_string()).into());
    }
    let anchor = config.resolve_anchor(Utc::now())?;
    info!(%anchor, threshold = config.clustering.similarity_threshold, "Run anchored");

    // Early check: the output dir must be writable before any work is done
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Load inputs ----
    let mut records = load_inputs(&args.inputs, &config.portal_hosts).await;
    if !feed_urls.is_empty() {
        let fetcher = RetryFetch::new(HttpFetcher::new(&config.feeds)?, &config.feeds);
        records.extend(load_feeds(&feed_urls, &fetcher, &config.portal_hosts).await);
    }
    if records.is_empty() {
        warn!("No records loaded; the digest will be empty");
    }

    // ---- Pipeline ----
    let output = run_pipeline(records, &config, anchor);
    for section in &output.sections {
        info!(section = %section.name, stories = section.items.len(), "Section ready");
    }

    // ---- Output ----
    match write_digest(&output, &args.output_dir).await {
        Ok(path) => info!(path = %path.display(), "Digest written"),
        Err(e) => {
            error!(error = %e, "Failed to write digest JSON");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        input = output.stats.input,
        shown = output.stats.shown,
        "Execution complete"
    );

    Ok(())
}
