//! Keyword partitioning of clustered stories into topical sections.
//!
//! A story can match several partitions; the cross-partition suppressor
//! decides where it is finally shown. Matching is a substring test over the
//! representative's title and snippet.

use crate::config::PartitionConfig;
use crate::dedup::Partition;
use crate::models::Cluster;
use tracing::{debug, info, instrument};

/// Name of the single partition used when none are configured.
pub const CATCH_ALL_PARTITION: &str = "all";

#[derive(Debug, Clone)]
pub struct Categorizer {
    partitions: Vec<PartitionConfig>,
}

impl Categorizer {
    /// With no configured partitions every story lands in [`CATCH_ALL_PARTITION`].
    pub fn new(partitions: &[PartitionConfig]) -> Self {
        let partitions = if partitions.is_empty() {
            vec![PartitionConfig {
                name: CATCH_ALL_PARTITION.to_string(),
                ..PartitionConfig::default()
            }]
        } else {
            partitions.to_vec()
        };
        Self { partitions }
    }

    pub fn partition_names(&self) -> Vec<&str> {
        self.partitions.iter().map(|p| p.name.as_str()).collect()
    }

    fn matches(partition: &PartitionConfig, text: &str) -> bool {
        let excluded = partition
            .exclude_keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()));
        if excluded {
            return false;
        }
        partition.keywords.is_empty() || partition.keywords.iter().any(|k| !k.is_empty() && text.contains(k.as_str()))
    }

    /// Assign each item to every partition whose keywords it mentions.
    pub fn assign<T: Clone>(&self, items: &[T], text_of: impl Fn(&T) -> String) -> Vec<Partition<T>> {
        let texts: Vec<String> = items.iter().map(&text_of).collect();
        self.partitions
            .iter()
            .map(|partition| {
                let members: Vec<T> = items
                    .iter()
                    .zip(&texts)
                    .filter(|(_, text)| Self::matches(partition, text))
                    .map(|(item, _)| item.clone())
                    .collect();
                debug!(partition = %partition.name, matched = members.len(), "Partition assigned");
                Partition::new(partition.name.clone(), members)
            })
            .collect()
    }

    #[instrument(level = "info", skip_all, fields(clusters = clusters.len()))]
    pub fn categorize(&self, clusters: &[Cluster]) -> Vec<Partition<Cluster>> {
        let partitions = self.assign(clusters, |c| c.representative.match_text());
        let uncategorized = clusters
            .iter()
            .filter(|c| {
                let text = c.representative.match_text();
                !self.partitions.iter().any(|p| Self::matches(p, &text))
            })
            .count();
        info!(
            partitions = ?self.partition_names(),
            uncategorized,
            "Stories partitioned"
        );
        partitions
    }
}
