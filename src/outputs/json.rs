//! JSON digest file for the renderer and delivery steps.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2026-01-12/
//!     └── digest.json
//! ```
//!
//! The directory is named after the anchor's calendar date in the digest's
//! timezone, so reruns for the same edition overwrite the same file.

use crate::error::{DigestError, Result};
use crate::models::{Cluster, DateConfidence, DuplicateRef, OriginPlatform};
use crate::pipeline::{DigestOutput, PipelineStats};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const DIGEST_FILE_NAME: &str = "digest.json";

/// Serialized shape of one run.
#[derive(Debug, Serialize)]
pub struct DigestDocument<'a> {
    pub anchor: DateTime<FixedOffset>,
    pub anchor_date: NaiveDate,
    pub stats: &'a PipelineStats,
    pub sections: Vec<SectionView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SectionView<'a> {
    pub name: &'a str,
    pub stories: Vec<StoryView<'a>>,
}

/// One representative as shown in the digest.
#[derive(Debug, Serialize)]
pub struct StoryView<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub source: &'a str,
    pub snippet: &'a str,
    pub origin_platform: OriginPlatform,
    pub resolved_published: Option<DateTime<FixedOffset>>,
    pub date_confidence: Option<DateConfidence>,
    pub date_unknown: bool,
    pub other_outlets: Vec<&'a str>,
    pub duplicates: &'a [DuplicateRef],
}

impl<'a> StoryView<'a> {
    fn from_cluster(cluster: &'a Cluster) -> Self {
        let rep = &cluster.representative;
        Self {
            title: &rep.record.title,
            url: &rep.record.url,
            source: &rep.record.source_name,
            snippet: &rep.record.snippet,
            origin_platform: rep.record.origin_platform,
            resolved_published: rep.resolved_published(),
            date_confidence: rep.published.confidence(),
            date_unknown: rep.date_unknown(),
            other_outlets: cluster.other_outlets(),
            duplicates: &cluster.duplicates,
        }
    }
}

impl<'a> DigestDocument<'a> {
    pub fn new(output: &'a DigestOutput) -> Self {
        Self {
            anchor: output.anchor,
            anchor_date: output.anchor.date_naive(),
            stats: &output.stats,
            sections: output
                .sections
                .iter()
                .map(|section| SectionView {
                    name: &section.name,
                    stories: section.items.iter().map(StoryView::from_cluster).collect(),
                })
                .collect(),
        }
    }
}

/// Write `output` to `{output_dir}/{anchor_date}/digest.json` and return the path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_digest(output: &DigestOutput, output_dir: &Path) -> Result<PathBuf> {
    let document = DigestDocument::new(output);
    let json = serde_json::to_string_pretty(&document)?;

    let full_dir = output_dir.join(document.anchor_date.to_string());
    info!(dir = %full_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_dir).await {
        error!(dir = %full_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(DigestError::io(&full_dir, e));
    }

    let path = full_dir.join(DIGEST_FILE_NAME);
    fs::write(&path, json).await.map_err(|e| DigestError::io(&path, e))?;
    info!(path = %path.display(), stories = output.stats.shown, "Wrote digest JSON");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DigestConfig;
    use crate::models::{PublishedRaw, RawRecord};
    use crate::pipeline::run_pipeline;
    use chrono::TimeZone;

    fn output() -> DigestOutput {
        let anchor = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 12, 9, 0, 0)
            .unwrap();
        let records = vec![
            RawRecord::new("렌즈 행사 개최", "https://a.com/1")
                .with_source("안경신문")
                .with_published(PublishedRaw::Text("2026-01-11 10:00".to_string())),
            RawRecord::new("[단독] 렌즈 행사 개최", "https://b.com/2").with_source("연합뉴스"),
            RawRecord::new("날짜 없는 기사", "https://c.com/3"),
        ];
        run_pipeline(records, &DigestConfig::default(), anchor)
    }

    #[test]
    fn test_document_shape() {
        let output = output();
        let value = serde_json::to_value(DigestDocument::new(&output)).unwrap();
        assert_eq!(value["anchor_date"], "2026-01-12");
        assert_eq!(value["stats"]["input"], 3);

        let stories = value["sections"][0]["stories"].as_array().unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0]["date_unknown"], false);
        assert_eq!(stories[0]["date_confidence"], "explicit_label");
        assert_eq!(stories[0]["duplicates"].as_array().unwrap().len(), 1);
        assert_eq!(stories[1]["date_unknown"], true);
        assert!(stories[1]["resolved_published"].is_null());
    }

    #[tokio::test]
    async fn test_write_digest_creates_dated_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_digest(&output(), dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("2026-01-12").join(DIGEST_FILE_NAME));

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["sections"][0]["name"], "all");
    }
}
