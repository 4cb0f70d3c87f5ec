//! Choosing which member of a story is shown.

use crate::config::SourceTier;
use crate::models::{Cluster, DigestRecord};
use crate::normalize::host_of;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

/// Ranks outlets by the configured tiers.
///
/// Tier `i` of the list ranks `i`. A named outlet outside every tier ranks
/// just below the last tier, and a record with no outlet name at all ranks
/// below that.
#[derive(Debug, Clone, Default)]
pub struct SourceRanker {
    by_name: HashMap<String, usize>,
    by_domain: Vec<(String, usize)>,
    tier_count: usize,
}

impl SourceRanker {
    pub fn new(tiers: &[SourceTier]) -> Self {
        let mut by_name = HashMap::new();
        let mut by_domain = Vec::new();
        for (rank, tier) in tiers.iter().enumerate() {
            for source in &tier.sources {
                by_name.entry(source.trim().to_string()).or_insert(rank);
            }
            for domain in &tier.domains {
                let domain = domain.trim().trim_start_matches("www.").to_lowercase();
                if !domain.is_empty() {
                    by_domain.push((domain, rank));
                }
            }
        }
        Self {
            by_name,
            by_domain,
            tier_count: tiers.len(),
        }
    }

    pub fn tier_of(&self, record: &DigestRecord) -> usize {
        let source = record.record.source_name.trim();
        if let Some(&rank) = self.by_name.get(source) {
            return rank;
        }
        if let Some(host) = host_of(&record.record.url) {
            let hit = self
                .by_domain
                .iter()
                .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")));
            if let Some((_, rank)) = hit {
                return *rank;
            }
        }
        if source.is_empty() {
            self.tier_count + 1
        } else {
            self.tier_count
        }
    }

    /// Pick the representative: best tier, then longest normalized title,
    /// then earliest arrival. Every other member becomes a duplicate entry.
    pub fn select(&self, mut members: Vec<DigestRecord>) -> Option<Cluster> {
        let (best, _) = members
            .iter()
            .enumerate()
            .min_by_key(|(_, m)| (self.tier_of(m), Reverse(m.key.title.chars().count())))?;
        let representative = members.remove(best);
        debug!(
            title = %representative.record.title,
            source = %representative.record.source_name,
            members = members.len() + 1,
            "Selected representative"
        );
        let duplicates = members.iter().map(DigestRecord::duplicate_ref).collect();
        Some(Cluster {
            representative,
            duplicates,
        })
    }
}
