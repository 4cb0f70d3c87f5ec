//! # story_digest
//!
//! Turns a day's worth of scraped news records into a digest that shows each
//! real-world story once.
//!
//! Collectors deliver records from publisher feeds, search portals and
//! aggregator APIs. The same story arrives many times: with tracking query
//! strings, with `[단독]` tags, from wire services and trade press, with a
//! date printed as `"3시간 전"` or not at all. This crate reconciles those
//! records:
//!
//! 1. **Keys**: [`normalize`] canonicalizes URLs and titles
//! 2. **Dates**: [`dates`] resolves one publish instant per record, or an
//!    explicit unknown
//! 3. **Filters**: [`filters`] drops blocked outlets, excluded topics and
//!    records outside the day window
//! 4. **Clusters**: [`dedup`] groups exact copies, merges near duplicates and
//!    picks the representative
//! 5. **Sections**: [`categorize`] partitions stories by keyword tables and
//!    [`dedup::suppress`] keeps each story in its first section only
//!
//! [`pipeline::run_pipeline`] runs the whole chain; [`ingest`] and
//! [`outputs`] handle the files and feeds around it.
//!
//! ```no_run
//! use story_digest::{DigestConfig, RawRecord, run_pipeline};
//! use chrono::{FixedOffset, TimeZone};
//!
//! let anchor = FixedOffset::east_opt(9 * 3600)
//!     .unwrap()
//!     .with_ymd_and_hms(2026, 1, 12, 9, 0, 0)
//!     .unwrap();
//! let records = vec![RawRecord::new("렌즈 행사 개최", "https://example.com/a")];
//! let digest = run_pipeline(records, &DigestConfig::default(), anchor);
//! assert_eq!(digest.stats.input, 1);
//! ```

pub mod categorize;
pub mod config;
pub mod dates;
pub mod dedup;
pub mod error;
pub mod filters;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod pipeline;
pub mod similarity;
pub mod utils;

pub use config::DigestConfig;
pub use error::DigestError;
pub use models::{Cluster, DigestRecord, PublishDate, RawRecord};
pub use pipeline::{DigestOutput, run_pipeline};
