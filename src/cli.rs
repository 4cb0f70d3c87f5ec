//! Command-line interface definitions.
//!
//! All options can also be supplied through environment variables.

use chrono::{DateTime, FixedOffset};
use clap::Parser;
use std::path::PathBuf;

/// Build a deduplicated daily news digest from collector output.
///
/// # Examples
///
/// ```sh
/// # Cluster two collector dumps with the default settings
/// story_digest -i google_news.xml -i industry.json -o ./digest
///
/// # Replay an earlier edition with a tuned configuration
/// story_digest -i dump.json -o ./digest -c digest.yaml --anchor 2026-01-12T08:00:00+09:00
///
/// # Fetch live feeds as well
/// story_digest -o ./digest --feed https://opticnews.co.kr/rss --query 아큐브
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input file (JSON records or RSS feed); repeat for several
    #[arg(short, long = "input")]
    pub inputs: Vec<PathBuf>,

    /// RSS feed URL to fetch; added to the configured feeds
    #[arg(long = "feed")]
    pub feeds: Vec<String>,

    /// Google News search query; added to the configured queries
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// Output directory for the digest JSON
    #[arg(short, long, env = "DIGEST_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Optional path to the YAML configuration
    #[arg(short, long, env = "DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Anchor instant (RFC 3339); overrides the configured anchor
    #[arg(long, env = "DIGEST_ANCHOR")]
    pub anchor: Option<DateTime<FixedOffset>>,

    /// Similarity threshold in [0, 1]; overrides the configured value
    #[arg(long, env = "DIGEST_THRESHOLD")]
    pub threshold: Option<f64>,
}
