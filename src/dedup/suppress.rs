//! Cross-partition suppression: a story is shown in its first partition only.

use crate::models::{Cluster, DigestRecord};
use crate::normalize::NormalizedKey;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Identity used to recognize a story already shown.
///
/// Records with no key signal fall back to their own arrival index, so two
/// unrelated keyless records never suppress each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SuppressionKey {
    Key(NormalizedKey),
    Record(usize),
}

/// Anything that can be placed in a partition and recognized across them.
pub trait StoryKey {
    fn suppression_key(&self) -> SuppressionKey;
}

impl StoryKey for DigestRecord {
    fn suppression_key(&self) -> SuppressionKey {
        if self.key.is_empty() {
            SuppressionKey::Record(self.index)
        } else {
            SuppressionKey::Key(self.key.clone())
        }
    }
}

impl StoryKey for Cluster {
    fn suppression_key(&self) -> SuppressionKey {
        self.representative.suppression_key()
    }
}

/// One named topical bucket, in the order its items were assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition<T> {
    pub name: String,
    pub items: Vec<T>,
}

impl<T> Partition<T> {
    pub fn new(name: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// Walk partitions in priority order, keeping each story only where it
/// first appears. Partition order and names are preserved; partitions may
/// come out empty.
pub fn suppress_cross_partition<T: StoryKey>(partitions: Vec<Partition<T>>) -> Vec<Partition<T>> {
    let mut seen: HashSet<SuppressionKey> = HashSet::new();
    partitions
        .into_iter()
        .map(|partition| {
            let before = partition.items.len();
            let items: Vec<T> = partition
                .items
                .into_iter()
                .filter(|item| seen.insert(item.suppression_key()))
                .collect();
            if items.len() < before {
                debug!(
                    partition = %partition.name,
                    dropped = before - items.len(),
                    "Suppressed stories already shown in an earlier partition"
                );
            }
            Partition {
                name: partition.name,
                items,
            }
        })
        .collect()
}
