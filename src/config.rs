//! Run configuration loaded from YAML.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes and [`DigestConfig::default`] is itself a usable configuration.
//! Keyword tables and source tiers are data, not code: the clustering core
//! only ever sees what this file supplies.
//!
//! ```yaml
//! timezone_offset_hours: 9
//! anchor:
//!   publication_time: "08:00:00"
//! clustering:
//!   similarity_threshold: 0.8
//! source_tiers:
//!   - name: industry
//!     sources: [안경신문, 옵티컬저널]
//! ```

use crate::dates::RelativeTimePolicy;
use crate::error::{DigestError, Result};
use crate::similarity::SimilarityMetric;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;
/// Upper bound for `days_back` and `span_days`, roughly ten years.
pub const MAX_WINDOW_DAYS: u32 = 3660;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Offset of the digest's home timezone; naive dates are read in it.
    pub timezone_offset_hours: i32,
    pub anchor: AnchorConfig,
    pub dates: DatesConfig,
    pub clustering: ClusteringConfig,
    /// Ranked outlet tiers, most preferred first.
    pub source_tiers: Vec<SourceTier>,
    pub filters: FilterConfig,
    /// Topical partitions in priority order.
    pub partitions: Vec<PartitionConfig>,
    /// Hosts whose links mark a record as coming from a search portal.
    pub portal_hosts: Vec<String>,
    pub feeds: FeedsConfig,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            timezone_offset_hours: DEFAULT_TIMEZONE_OFFSET_HOURS,
            anchor: AnchorConfig::default(),
            dates: DatesConfig::default(),
            clustering: ClusteringConfig::default(),
            source_tiers: Vec::new(),
            filters: FilterConfig::default(),
            partitions: Vec::new(),
            portal_hosts: vec![
                "news.google.com".to_string(),
                "search.naver.com".to_string(),
                "n.news.naver.com".to_string(),
                "news.naver.com".to_string(),
                "v.daum.net".to_string(),
                "search.daum.net".to_string(),
            ],
            feeds: FeedsConfig::default(),
        }
    }
}

/// How the run's reference instant is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Fixed anchor, mainly for replaying a past run.
    pub instant: Option<DateTime<FixedOffset>>,
    /// Local time of day the digest goes out; the anchor becomes today at
    /// this time instead of the moment the run started.
    pub publication_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatesConfig {
    pub relative_policy: RelativeTimePolicy,
}

/// Thresholds and gates of the fuzzy clustering stage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum ratio in `[0, 1]` for two groups to merge.
    pub similarity_threshold: f64,
    pub metric: SimilarityMetric,
    /// Only merge groups that both mention a common entry of `entity_list`.
    pub require_shared_entity: bool,
    pub entity_list: Vec<String>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            metric: SimilarityMetric::default(),
            require_shared_entity: false,
            entity_list: Vec::new(),
        }
    }
}

/// One rank of outlets. Matched by exact outlet name or by link host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceTier {
    pub name: String,
    pub sources: Vec<String>,
    pub domains: Vec<String>,
}

/// A named, versioned list of keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeywordTable {
    pub name: String,
    pub version: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub blocked_domains: Vec<String>,
    /// Records mentioning any keyword of any table are dropped.
    pub exclude: Vec<KeywordTable>,
    /// Day filter; `None` keeps every dated record.
    pub day_window: Option<DayWindowConfig>,
}

/// Keep records published on `[anchor_date - days_back, + span_days)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DayWindowConfig {
    pub days_back: u32,
    pub span_days: u32,
}

impl Default for DayWindowConfig {
    /// Yesterday only.
    fn default() -> Self {
        Self {
            days_back: 1,
            span_days: 1,
        }
    }
}

/// One topical partition. An empty keyword list matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub name: String,
    pub version: String,
    pub keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
}

/// Feeds fetched over HTTP in addition to the input files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub urls: Vec<String>,
    /// Each query becomes a Google News search feed.
    pub google_news_queries: Vec<String>,
    pub language: String,
    pub region: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    pub user_agent: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            google_news_queries: Vec::new(),
            language: "ko".to_string(),
            region: "KR".to_string(),
            timeout_secs: 15,
            max_retries: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 250,
            user_agent: format!("story_digest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DigestConfig {
    /// Read, parse and validate a YAML configuration file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;
        let config = Self::from_yaml_str(&text)?;
        info!(
            tiers = config.source_tiers.len(),
            partitions = config.partitions.len(),
            threshold = config.clustering.similarity_threshold,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.clustering.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DigestError::Config(format!(
                "clustering.similarity_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.clustering.require_shared_entity
            && self.clustering.entity_list.iter().all(|e| e.trim().is_empty())
        {
            return Err(DigestError::Config(
                "clustering.require_shared_entity is set but clustering.entity_list is empty".to_string(),
            ));
        }
        if !(-12..=14).contains(&self.timezone_offset_hours) {
            return Err(DigestError::Config(format!(
                "timezone_offset_hours must be within [-12, 14], got {}",
                self.timezone_offset_hours
            )));
        }
        if let Some(window) = self.filters.day_window {
            if window.span_days == 0 {
                return Err(DigestError::Config(
                    "filters.day_window.span_days must be at least 1".to_string(),
                ));
            }
            if window.days_back > MAX_WINDOW_DAYS || window.span_days > MAX_WINDOW_DAYS {
                return Err(DigestError::Config(format!(
                    "filters.day_window days_back and span_days must be at most {MAX_WINDOW_DAYS}, got {} and {}",
                    window.days_back, window.span_days
                )));
            }
        }
        if self.feeds.timeout_secs == 0 {
            return Err(DigestError::Config("feeds.timeout_secs must be at least 1".to_string()));
        }
        if let Some(bad) = self
            .feeds
            .urls
            .iter()
            .find(|u| !matches!(url::Url::parse(u.trim()), Ok(parsed) if matches!(parsed.scheme(), "http" | "https")))
        {
            return Err(DigestError::Config(format!("feeds.urls entry {bad:?} is not an http(s) URL")));
        }
        if let Some(p) = self.partitions.iter().find(|p| p.name.trim().is_empty()) {
            return Err(DigestError::Config(format!(
                "partition with keywords {:?} has no name",
                p.keywords
            )));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600).ok_or_else(|| {
            DigestError::Config(format!(
                "timezone_offset_hours {} is not a valid offset",
                self.timezone_offset_hours
            ))
        })
    }

    /// Pick the anchor instant for a run started at `now`.
    ///
    /// An explicit instant wins; otherwise `now` in the configured timezone,
    /// moved to the publication time of day when one is set.
    pub fn resolve_anchor(&self, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
        let tz = self.timezone()?;
        if let Some(instant) = self.anchor.instant {
            return Ok(instant.with_timezone(&tz));
        }
        let local_now = now.with_timezone(&tz);
        let anchor = match self.anchor.publication_time {
            Some(time) => tz
                .from_local_datetime(&local_now.date_naive().and_time(time))
                .single()
                .unwrap_or(local_now),
            None => local_now,
        };
        debug!(%anchor, "Resolved anchor instant");
        Ok(anchor)
    }
}
