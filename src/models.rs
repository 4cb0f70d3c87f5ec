//! Data models for scraped records and the derived values the digest attaches.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`RawRecord`]: one scrape result as delivered by a collector
//! - [`PublishDate`] / [`DateCandidate`]: the reconciled publish instant, or an explicit unknown
//! - [`DigestRecord`]: a raw record plus its comparison key and publish date
//! - [`Cluster`]: one story, its representative and the suppressed duplicates
//!
//! Serialized field names use camelCase to match the JSON the collectors
//! already emit.

use crate::normalize::NormalizedKey;
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Where a record was discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginPlatform {
    /// A publisher's own syndication feed or API.
    #[default]
    PrimaryFeed,
    /// A search portal or news aggregator result page.
    SearchPortal,
}

/// The publish date exactly as the collector saw it.
///
/// Feeds usually hand over a machine-readable instant, portals hand over
/// display text such as `"3시간 전"` or `"2026.01.12."`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PublishedRaw {
    /// A timestamp that already carries an offset.
    Instant(DateTime<FixedOffset>),
    /// Free-form date text.
    Text(String),
}

impl PublishedRaw {
    /// The textual form, if this value still needs parsing.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PublishedRaw::Instant(_) => None,
            PublishedRaw::Text(s) => Some(s.as_str()),
        }
    }
}

/// A raw news record as scraped from a source.
///
/// Created once per scrape result and never modified afterwards; everything
/// the pipeline computes lives on [`DigestRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Headline as published.
    #[serde(default)]
    pub title: String,
    /// Link to the article.
    #[serde(default)]
    pub url: String,
    /// Publish date signal, if the source exposed one.
    #[serde(default)]
    pub published_raw: Option<PublishedRaw>,
    /// Outlet name. Empty when the collector could not tell.
    #[serde(default)]
    pub source_name: String,
    /// Short description or summary shown next to the headline.
    #[serde(default)]
    pub snippet: String,
    /// Full article text or page markup, when it was fetched.
    #[serde(default)]
    pub body_text: Option<String>,
    /// Which kind of source produced the record.
    #[serde(default)]
    pub origin_platform: OriginPlatform,
}

impl RawRecord {
    /// Minimal record with a title and link; every other field empty.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_raw: None,
            source_name: String::new(),
            snippet: String::new(),
            body_text: None,
            origin_platform: OriginPlatform::PrimaryFeed,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = source.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_published(mut self, published: PublishedRaw) -> Self {
        self.published_raw = Some(published);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_text = Some(body.into());
        self
    }

    pub fn with_platform(mut self, platform: OriginPlatform) -> Self {
        self.origin_platform = platform;
        self
    }
}

/// How a publish date was obtained, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateConfidence {
    /// The record's own date field, or a date printed right after an "입력"/"등록" style label.
    ExplicitLabel,
    /// Meta tags or JSON-LD in the page markup.
    StructuredMetadata,
    /// "3시간 전" / "2 days ago", resolved against the anchor instant.
    RelativePhrase,
    /// Closest absolute date found anywhere in the text.
    FallbackScan,
}

/// One resolved publish instant and the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateCandidate {
    pub value: DateTime<FixedOffset>,
    pub confidence: DateConfidence,
}

impl DateCandidate {
    pub fn new(value: DateTime<FixedOffset>, confidence: DateConfidence) -> Self {
        Self { value, confidence }
    }
}

/// Outcome of date reconciliation: a chosen instant, or an explicit unknown.
///
/// `Unknown` is never replaced by "now"; day filters must drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishDate {
    Resolved(DateCandidate),
    Unknown,
}

impl PublishDate {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PublishDate::Unknown)
    }

    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            PublishDate::Resolved(c) => Some(c.value),
            PublishDate::Unknown => None,
        }
    }

    pub fn confidence(&self) -> Option<DateConfidence> {
        match self {
            PublishDate::Resolved(c) => Some(c.confidence),
            PublishDate::Unknown => None,
        }
    }
}

/// A raw record with its derived comparison key and publish date attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestRecord {
    /// Arrival position in the run's input; used as record identity.
    #[serde(skip)]
    pub index: usize,
    #[serde(flatten)]
    pub record: RawRecord,
    pub key: NormalizedKey,
    pub published: PublishDate,
}

impl DigestRecord {
    pub fn new(index: usize, record: RawRecord, key: NormalizedKey, published: PublishDate) -> Self {
        Self {
            index,
            record,
            key,
            published,
        }
    }

    /// The reconciled publish instant, absent when the date is unknown.
    pub fn resolved_published(&self) -> Option<DateTime<FixedOffset>> {
        self.published.instant()
    }

    pub fn date_unknown(&self) -> bool {
        self.published.is_unknown()
    }

    /// Title and snippet joined, the text keyword tables are matched against.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.record.title, self.record.snippet)
    }

    pub fn duplicate_ref(&self) -> DuplicateRef {
        DuplicateRef {
            record_index: self.index,
            source: self.record.source_name.clone(),
            url: self.record.url.clone(),
            title: self.record.title.clone(),
        }
    }
}

/// A suppressed member of a cluster, as rendered under "+N other outlets".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRef {
    /// Arrival position of the suppressed record.
    #[serde(skip)]
    pub record_index: usize,
    pub source: String,
    pub url: String,
    pub title: String,
}

/// One story: the record shown in the digest plus every record folded into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub representative: DigestRecord,
    pub duplicates: Vec<DuplicateRef>,
}

impl Cluster {
    /// Number of input records this cluster accounts for.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.duplicates.len() + 1
    }

    /// Outlet names among the duplicates, without repeats and without the
    /// representative's own outlet.
    pub fn other_outlets(&self) -> Vec<&str> {
        let own = self.representative.record.source_name.trim();
        self.duplicates
            .iter()
            .map(|d| d.source.trim())
            .filter(|s| !s.is_empty() && *s != own)
            .unique()
            .collect()
    }
}
