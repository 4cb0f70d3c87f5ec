//! End-to-end digest run over a finished batch of raw records.
//!
//! prepare (keys + dates) → exclusion filters → day window → exact match →
//! fuzzy clustering → partitioning → cross-partition suppression.
//!
//! Everything here is synchronous and in-memory; the same input, config and
//! anchor always give the same output.

use crate::categorize::Categorizer;
use crate::config::DigestConfig;
use crate::dates::DateReconciler;
use crate::dedup::{Partition, SourceRanker, cluster_records, suppress_cross_partition};
use crate::filters::{DayWindow, ExclusionFilter};
use crate::models::{Cluster, DigestRecord, RawRecord};
use crate::normalize::NormalizedKey;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{info, instrument};

/// Record counts after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub input: usize,
    pub date_unknown: usize,
    pub excluded: usize,
    pub outside_window: usize,
    pub clustered_records: usize,
    pub clusters: usize,
    pub suppressed: usize,
    pub shown: usize,
}

/// Result of one run: the surviving stories per partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestOutput {
    pub anchor: DateTime<FixedOffset>,
    pub sections: Vec<Partition<Cluster>>,
    pub stats: PipelineStats,
}

impl DigestOutput {
    pub fn stories(&self) -> impl Iterator<Item = &Cluster> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

/// Attach keys and resolved dates; `index` is the arrival position.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub fn prepare_records(records: Vec<RawRecord>, reconciler: &DateReconciler) -> Vec<DigestRecord> {
    let prepared: Vec<DigestRecord> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let key = NormalizedKey::from_parts(&record.url, &record.title);
            let published = reconciler.resolve(&record);
            DigestRecord::new(index, record, key, published)
        })
        .collect();
    let unknown = prepared.iter().filter(|r| r.date_unknown()).count();
    info!(
        records = prepared.len(),
        date_unknown = unknown,
        anchor = %reconciler.anchor(),
        "Records prepared"
    );
    prepared
}

/// Run every stage with `config` against `anchor`.
///
/// `config` is expected to have passed [`DigestConfig::validate`]; the anchor
/// is moved into the configured timezone before dates are resolved.
#[instrument(level = "info", skip_all, fields(records = records.len(), %anchor))]
pub fn run_pipeline(records: Vec<RawRecord>, config: &DigestConfig, anchor: DateTime<FixedOffset>) -> DigestOutput {
    let anchor = match config.timezone() {
        Ok(tz) => anchor.with_timezone(&tz),
        Err(_) => anchor,
    };
    let mut stats = PipelineStats {
        input: records.len(),
        ..PipelineStats::default()
    };

    let reconciler = DateReconciler::new(anchor, config.dates.relative_policy);
    let prepared = prepare_records(records, &reconciler);
    stats.date_unknown = prepared.iter().filter(|r| r.date_unknown()).count();

    let filtered = ExclusionFilter::new(&config.filters).apply(prepared);
    stats.excluded = stats.input - filtered.len();

    let dated = match config.filters.day_window {
        Some(window) => DayWindow::new(window, anchor).apply(filtered),
        None => filtered,
    };
    stats.outside_window = stats.input - stats.excluded - dated.len();
    stats.clustered_records = dated.len();

    let ranker = SourceRanker::new(&config.source_tiers);
    let clusters = cluster_records(dated, &config.clustering, &ranker);
    stats.clusters = clusters.len();

    let partitioned = Categorizer::new(&config.partitions).categorize(&clusters);
    let placements: usize = partitioned.iter().map(|p| p.items.len()).sum();
    let sections = suppress_cross_partition(partitioned);
    stats.shown = sections.iter().map(|p| p.items.len()).sum();
    stats.suppressed = placements - stats.shown;

    info!(
        input = stats.input,
        excluded = stats.excluded,
        outside_window = stats.outside_window,
        clusters = stats.clusters,
        shown = stats.shown,
        "Digest pipeline complete"
    );

    DigestOutput {
        anchor,
        sections,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DayWindowConfig, KeywordTable, PartitionConfig, SourceTier};
    use crate::dates::RelativeTimePolicy;
    use crate::models::{OriginPlatform, PublishedRaw};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn anchor() -> DateTime<FixedOffset> {
        kst().with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap()
    }

    fn text(s: &str) -> PublishedRaw {
        PublishedRaw::Text(s.to_string())
    }

    fn config() -> DigestConfig {
        let mut config = DigestConfig::default();
        config.source_tiers = vec![
            SourceTier {
                name: "industry".to_string(),
                sources: vec!["안경신문".to_string()],
                domains: vec![],
            },
            SourceTier {
                name: "wire".to_string(),
                sources: vec!["연합뉴스".to_string()],
                domains: vec![],
            },
        ];
        config.partitions = vec![
            PartitionConfig {
                name: "acuvue".to_string(),
                keywords: vec!["아큐브".to_string()],
                ..PartitionConfig::default()
            },
            PartitionConfig {
                name: "trend".to_string(),
                keywords: vec!["행사".to_string(), "안경원".to_string()],
                ..PartitionConfig::default()
            },
            PartitionConfig {
                name: "eye_health".to_string(),
                keywords: vec!["눈 건강".to_string()],
                ..PartitionConfig::default()
            },
        ];
        config.filters.exclude = vec![KeywordTable {
            name: "finance".to_string(),
            version: "1".to_string(),
            keywords: vec!["주가".to_string()],
        }];
        config.filters.day_window = Some(DayWindowConfig {
            days_back: 1,
            span_days: 2,
        });
        config
    }

    fn batch() -> Vec<RawRecord> {
        let snippet_a = "한국존슨앤드존슨 비전이 12일 서울에서 아큐브 신제품 렌즈 출시 행사를 개최했다고 밝혔다";
        let snippet_b = "한국존슨앤드존슨 비전이 12일 서울에서 아큐브 신제품 렌즈 출시 행사를 열었다고 밝혔다";
        vec![
            RawRecord::new("렌즈 행사 개최", "https://yna.co.kr/a?utm=rss")
                .with_source("연합뉴스")
                .with_snippet(snippet_a)
                .with_published(text("2026-01-11 10:00")),
            RawRecord::new("렌즈 행사 개최", "https://yna.co.kr/a")
                .with_source("연합뉴스")
                .with_snippet(snippet_a)
                .with_published(text("2026-01-11 10:00")),
            RawRecord::new("[단독] 렌즈 행사 개최", "https://opticnews.co.kr/1")
                .with_source("안경신문")
                .with_snippet(snippet_b)
                .with_published(text("3시간 전"))
                .with_platform(OriginPlatform::SearchPortal),
            RawRecord::new("안경원 체인 눈 건강 캠페인", "https://b.com/2")
                .with_body("<html><body><p>입력 2026.01.11 14:32</p></body></html>"),
            RawRecord::new("렌즈 업체 주가 급등", "https://c.com/3").with_published(text("2026-01-11")),
            RawRecord::new("날짜 없는 기사", "https://d.com/4"),
            RawRecord::new("오래된 행사 기사", "https://e.com/5").with_published(text("2025-06-01")),
        ]
    }

    #[test]
    fn test_run_pipeline_end_to_end() {
        let output = run_pipeline(batch(), &config(), anchor());
        let stats = output.stats;
        assert_eq!(stats.input, 7);
        assert_eq!(stats.date_unknown, 1);
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.outside_window, 2);
        assert_eq!(stats.clustered_records, 4);
        assert_eq!(stats.clusters, 2);

        let names: Vec<_> = output.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["acuvue", "trend", "eye_health"]);

        // lens story: shown once, in the first partition it matches
        let acuvue = &output.sections[0].items;
        assert_eq!(acuvue.len(), 1);
        assert_eq!(acuvue[0].representative.record.source_name, "안경신문");
        assert_eq!(acuvue[0].duplicates.len(), 2);
        assert_eq!(
            acuvue[0].representative.resolved_published(),
            Some(kst().with_ymd_and_hms(2026, 1, 12, 6, 0, 0).unwrap())
        );

        // campaign story matched trend and eye_health; kept only in trend
        let trend = &output.sections[1].items;
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].representative.record.title, "안경원 체인 눈 건강 캠페인");
        assert!(output.sections[2].items.is_empty());
        assert_eq!(stats.suppressed, 2);
        assert_eq!(stats.shown, 2);
    }

    #[test]
    fn test_prepare_records_resolves_against_reconciler_anchor() {
        let reconciler = DateReconciler::new(anchor(), RelativeTimePolicy::AnyUnit);
        assert_eq!(reconciler.anchor(), anchor());
        let prepared = prepare_records(
            vec![RawRecord::new("아큐브 행사", "https://a.com/1").with_published(text("2시간 전"))],
            &reconciler,
        );
        assert_eq!(prepared[0].index, 0);
        assert_eq!(
            prepared[0].resolved_published(),
            Some(kst().with_ymd_and_hms(2026, 1, 12, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_run_pipeline_is_deterministic() {
        let a = run_pipeline(batch(), &config(), anchor());
        let b = run_pipeline(batch(), &config(), anchor());
        assert_eq!(a, b);
    }

    #[test]
    fn test_without_filters_every_record_is_accounted_for() {
        let output = run_pipeline(batch(), &DigestConfig::default(), anchor());
        assert_eq!(output.stats.clustered_records, 7);
        let total: usize = output.stories().map(Cluster::len).sum();
        assert_eq!(total, 7);

        let mut keys = HashSet::new();
        for story in output.stories() {
            assert!(keys.insert(story.representative.index));
        }
    }

    #[test]
    fn test_one_day_policy_drops_imprecise_relative_dates() {
        let mut config = config();
        config.dates.relative_policy = RelativeTimePolicy::OneDayOnly;
        let records = vec![
            RawRecord::new("아큐브 행사", "https://a.com/1").with_published(text("8개월 전")),
            RawRecord::new("아큐브 캠페인", "https://a.com/2").with_published(text("1일 전")),
        ];
        let output = run_pipeline(records, &config, anchor());
        assert_eq!(output.stats.date_unknown, 1);
        assert_eq!(output.stats.outside_window, 1);
        let titles: Vec<_> = output.stories().map(|c| c.representative.record.title.as_str()).collect();
        assert_eq!(titles, vec!["아큐브 캠페인"]);
    }

    #[test]
    fn test_anchor_is_moved_into_configured_zone() {
        let utc_anchor = chrono::Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap().fixed_offset();
        let output = run_pipeline(Vec::new(), &DigestConfig::default(), utc_anchor);
        assert_eq!(output.anchor.offset(), &kst());
        assert_eq!(output.anchor, utc_anchor);
        assert_eq!(output.stats, PipelineStats::default());
    }
}
