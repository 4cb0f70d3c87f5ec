//! Two-stage story deduplication.
//!
//! # Stages
//!
//! - [`exact`]: records with equal normalized `(url, title)` keys form one group
//! - [`fuzzy`]: groups whose snippets or titles score above the threshold merge
//! - [`representative`]: each merged cluster picks the record to show
//! - [`suppress`]: after topical partitioning, a story survives only in its
//!   first partition
//!
//! Every input record ends up in exactly one [`Cluster`], either as its
//! representative or as one of its duplicates.

pub mod exact;
pub mod fuzzy;
pub mod representative;
pub mod suppress;

pub use exact::{ExactGroup, group_exact};
pub use fuzzy::{ClusterAccumulator, bucket_keys, cluster_groups};
pub use representative::SourceRanker;
pub use suppress::{Partition, StoryKey, SuppressionKey, suppress_cross_partition};

use crate::config::ClusteringConfig;
use crate::models::{Cluster, DigestRecord};
use tracing::{info, instrument};

/// Collapse exact duplicates, merge near duplicates and choose representatives.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub fn cluster_records(
    records: Vec<DigestRecord>,
    settings: &ClusteringConfig,
    ranker: &SourceRanker,
) -> Vec<Cluster> {
    let total = records.len();
    let groups = group_exact(records);
    info!(groups = groups.len(), records = total, "Exact-match grouping complete");

    let clusters: Vec<Cluster> = cluster_groups(groups, settings)
        .into_iter()
        .filter_map(|pending| ranker.select(pending.members))
        .collect();
    info!(
        clusters = clusters.len(),
        threshold = settings.similarity_threshold,
        metric = ?settings.metric,
        "Fuzzy clustering complete"
    );
    clusters
}
