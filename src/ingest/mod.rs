//! Loading raw records from collector output files.
//!
//! # Submodules
//!
//! - [`json`]: arrays of records as written by the collectors
//! - [`rss`]: RSS 2.0 publisher and aggregator feeds
//! - [`fetch`]: HTTP fetching of feed URLs, with retries
//!
//! Files and feeds load concurrently but come back in argument order. An
//! input that cannot be read, fetched or parsed is logged and skipped; the
//! rest of the batch still runs.

pub mod fetch;
pub mod json;
pub mod rss;

use crate::error::{DigestError, Result};
use fetch::FetchText;
use crate::models::{OriginPlatform, RawRecord};
use crate::normalize::host_of;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// How many input files are read at once.
const PARALLEL_LOADS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Rss,
}

impl InputFormat {
    /// By extension first, then by the first non-blank character.
    pub fn detect(path: &Path, contents: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => InputFormat::Json,
            Some("xml" | "rss") => InputFormat::Rss,
            _ if contents.trim_start().starts_with('<') => InputFormat::Rss,
            _ => InputFormat::Json,
        }
    }
}

/// Whether `url` points at one of the configured portal hosts.
pub fn is_portal_url(url: &str, portal_hosts: &[String]) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    portal_hosts.iter().any(|p| {
        let p = p.trim().trim_start_matches("www.").to_lowercase();
        !p.is_empty() && (host == p || host.ends_with(&format!(".{p}")))
    })
}

/// Mark records discovered through a portal link as [`OriginPlatform::SearchPortal`].
pub fn tag_portal_records(records: &mut [RawRecord], portal_hosts: &[String]) {
    for record in records.iter_mut() {
        if record.origin_platform == OriginPlatform::PrimaryFeed && is_portal_url(&record.url, portal_hosts) {
            record.origin_platform = OriginPlatform::SearchPortal;
        }
    }
}

/// Read and parse one input file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_file(path: &Path, portal_hosts: &[String]) -> Result<Vec<RawRecord>> {
    let contents = fs::read_to_string(path).await.map_err(|e| DigestError::io(path, e))?;
    let format = InputFormat::detect(path, &contents);
    debug!(?format, bytes = contents.len(), "Read input file");

    let mut records = match format {
        InputFormat::Json => json::parse_records(&contents)?,
        InputFormat::Rss => rss::parse_feed(&contents, &path.display().to_string())?,
    };
    tag_portal_records(&mut records, portal_hosts);
    info!(count = records.len(), ?format, "Loaded records");
    Ok(records)
}

/// Load every input, concurrently, concatenated in argument order.
#[instrument(level = "info", skip_all, fields(inputs = paths.len()))]
pub async fn load_inputs(paths: &[PathBuf], portal_hosts: &[String]) -> Vec<RawRecord> {
    let start = Instant::now();
    let loaded: Vec<Vec<RawRecord>> = stream::iter(paths)
        .map(|path| async move {
            match load_file(path, portal_hosts).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable input");
                    Vec::new()
                }
            }
        })
        .buffered(PARALLEL_LOADS)
        .collect()
        .await;

    let records: Vec<RawRecord> = loaded.into_iter().flatten().collect();
    let elapsed = start.elapsed();
    info!(count = records.len(), ?elapsed, "Inputs loaded");
    records
}

/// Fetch and parse one RSS feed URL.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn load_feed<F: FetchText>(url: &str, fetcher: &F, portal_hosts: &[String]) -> Result<Vec<RawRecord>> {
    let body = fetcher.fetch(url).await?;
    let mut records = rss::parse_feed(&body, url)?;
    tag_portal_records(&mut records, portal_hosts);
    info!(count = records.len(), "Loaded feed");
    Ok(records)
}

/// Fetch every feed, concurrently, concatenated in the order given.
#[instrument(level = "info", skip_all, fields(feeds = urls.len()))]
pub async fn load_feeds<F: FetchText>(urls: &[String], fetcher: &F, portal_hosts: &[String]) -> Vec<RawRecord> {
    let start = Instant::now();
    let loaded: Vec<Vec<RawRecord>> = stream::iter(urls)
        .map(|url| async move {
            match load_feed(url, fetcher, portal_hosts).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(%url, error = %e, "Skipping unavailable feed");
                    Vec::new()
                }
            }
        })
        .buffered(PARALLEL_LOADS)
        .collect()
        .await;

    let records: Vec<RawRecord> = loaded.into_iter().flatten().collect();
    info!(count = records.len(), elapsed = ?start.elapsed(), "Feeds loaded");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn portals() -> Vec<String> {
        vec!["news.google.com".to_string(), "www.naver.com".to_string()]
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(InputFormat::detect(Path::new("a.json"), "<rss>"), InputFormat::Json);
        assert_eq!(InputFormat::detect(Path::new("a.XML"), "[]"), InputFormat::Rss);
        assert_eq!(InputFormat::detect(Path::new("feed"), "  <?xml"), InputFormat::Rss);
        assert_eq!(InputFormat::detect(Path::new("dump"), "[]"), InputFormat::Json);
    }

    #[test]
    fn test_portal_detection() {
        assert!(is_portal_url("https://news.google.com/rss/articles/x", &portals()));
        assert!(is_portal_url("https://n.news.naver.com/a", &portals()));
        assert!(!is_portal_url("https://opticnews.co.kr/a", &portals()));
        assert!(!is_portal_url("", &portals()));
    }

    #[tokio::test]
    async fn test_load_inputs_keeps_order_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("portal.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        write!(
            f,
            r#"[{{"title": "포털 기사", "url": "https://news.google.com/rss/articles/1"}}]"#
        )
        .unwrap();

        let rss_path = dir.path().join("optic.xml");
        std::fs::write(
            &rss_path,
            "<rss><channel><title>안경신문</title><item><title>렌즈 행사</title><link>https://opticnews.co.kr/1</link></item></channel></rss>",
        )
        .unwrap();

        let bad_path = dir.path().join("broken.json");
        std::fs::write(&bad_path, "{oops").unwrap();
        let missing = dir.path().join("missing.json");

        let paths = vec![rss_path, bad_path, missing, json_path];
        let records = load_inputs(&paths, &portals()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "렌즈 행사");
        assert_eq!(records[0].source_name, "안경신문");
        assert_eq!(records[0].origin_platform, OriginPlatform::PrimaryFeed);
        assert_eq!(records[1].title, "포털 기사");
        assert_eq!(records[1].origin_platform, OriginPlatform::SearchPortal);
    }

    struct CannedFetcher;

    impl FetchText for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            match url {
                "https://opticnews.co.kr/rss" => Ok("<rss><channel><title>안경신문</title>\
                    <item><title>렌즈 행사</title><link>https://opticnews.co.kr/1</link></item>\
                    </channel></rss>"
                    .to_string()),
                "https://broken.example/rss" => Ok("<rss><item><title>x</item>".to_string()),
                _ => Err(DigestError::feed(url, "unreachable")),
            }
        }
    }

    #[tokio::test]
    async fn test_load_feeds_skips_failures() {
        let urls = vec![
            "https://down.example/rss".to_string(),
            "https://broken.example/rss".to_string(),
            "https://opticnews.co.kr/rss".to_string(),
        ];
        let records = load_feeds(&urls, &CannedFetcher, &portals()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_name, "안경신문");
        assert_eq!(records[0].origin_platform, OriginPlatform::PrimaryFeed);
    }

    #[tokio::test]
    async fn test_load_file_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        assert!(matches!(load_file(&missing, &[]).await, Err(DigestError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2]").unwrap();
        assert!(matches!(load_file(&bad, &[]).await, Err(DigestError::Json(_))));
    }
}
