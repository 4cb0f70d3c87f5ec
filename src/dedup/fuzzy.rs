//! Stage 2: merge exact groups that tell the same story in different words.
//!
//! Groups are folded, in arrival order, into an accumulator holding the
//! clusters formed so far and a bucket index over their leading title
//! tokens. A group is only scored against clusters that share a bucket key
//! with it and were formed before it; the first cluster scoring at or above
//! the threshold absorbs it. A group that merges does not register its own
//! bucket keys, so later groups reach the cluster only through the founding
//! group's title.

use super::exact::ExactGroup;
use crate::config::ClusteringConfig;
use crate::models::DigestRecord;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Tokens shorter than this many characters do not form bucket keys.
const MIN_BUCKET_TOKEN_CHARS: usize = 2;

/// Bucket keys of a normalized title: its first token, first two tokens and
/// first three tokens, skipping one-character tokens.
pub fn bucket_keys(normalized_title: &str) -> Vec<String> {
    let tokens: Vec<&str> = normalized_title
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_BUCKET_TOKEN_CHARS)
        .take(3)
        .collect();
    (1..=tokens.len()).map(|n| tokens[..n].join(" ")).collect()
}

/// Entities from `entity_list` mentioned in a record's title or snippet.
fn mentioned_entities<'e>(record: &DigestRecord, entity_list: &'e [String]) -> BTreeSet<&'e str> {
    let text = record.match_text().to_lowercase();
    entity_list
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && text.contains(&e.to_lowercase()))
        .collect()
}

/// Members of one story while clustering is still running.
#[derive(Debug)]
pub struct PendingCluster {
    pub members: Vec<DigestRecord>,
}

impl PendingCluster {
    /// The founding group's first record, which every later group is scored against.
    fn probe(&self) -> &DigestRecord {
        &self.members[0]
    }
}

/// Fold state: clusters formed so far plus the bucket index over them.
#[derive(Debug)]
pub struct ClusterAccumulator<'c> {
    settings: &'c ClusteringConfig,
    buckets: HashMap<String, Vec<usize>>,
    clusters: Vec<PendingCluster>,
}

impl<'c> ClusterAccumulator<'c> {
    pub fn new(settings: &'c ClusteringConfig) -> Self {
        Self {
            settings,
            buckets: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    /// Similarity on snippets when both records have one, else on the
    /// normalized titles, so `[단독]` and `(종합)` tags never cost score.
    pub fn similarity(&self, a: &DigestRecord, b: &DigestRecord) -> f64 {
        let metric = self.settings.metric;
        if !a.record.snippet.trim().is_empty() && !b.record.snippet.trim().is_empty() {
            metric.ratio(&a.record.snippet, &b.record.snippet)
        } else {
            metric.ratio(&a.key.title, &b.key.title)
        }
    }

    fn shares_entity(&self, a: &DigestRecord, b: &DigestRecord) -> bool {
        if !self.settings.require_shared_entity {
            return true;
        }
        let list = &self.settings.entity_list;
        let left = mentioned_entities(a, list);
        !left.is_empty() && !left.is_disjoint(&mentioned_entities(b, list))
    }

    /// Merge `group` into the first earlier cluster it matches, or start a
    /// new cluster with it.
    pub fn absorb(mut self, group: ExactGroup) -> Self {
        let keys = bucket_keys(&group.first().key.title);
        let candidates: BTreeSet<usize> = keys
            .iter()
            .filter_map(|k| self.buckets.get(k))
            .flatten()
            .copied()
            .collect();

        let threshold = self.settings.similarity_threshold;
        let target = candidates.into_iter().find(|&slot| {
            let probe = self.clusters[slot].probe();
            let base = group.first();
            let score = self.similarity(base, probe);
            score >= threshold && self.shares_entity(base, probe)
        });

        match target {
            Some(slot) => {
                debug!(
                    title = %group.first().record.title,
                    into = %self.clusters[slot].probe().record.title,
                    members = group.len(),
                    "Merged near-duplicate group"
                );
                self.clusters[slot].members.extend(group.members);
            }
            None => {
                let slot = self.clusters.len();
                for key in keys {
                    self.buckets.entry(key).or_default().push(slot);
                }
                self.clusters.push(PendingCluster {
                    members: group.members,
                });
            }
        }
        self
    }

    pub fn finish(self) -> Vec<PendingCluster> {
        self.clusters
    }
}

/// Run the fold over all groups in order.
pub fn cluster_groups(groups: Vec<ExactGroup>, settings: &ClusteringConfig) -> Vec<PendingCluster> {
    groups
        .into_iter()
        .fold(ClusterAccumulator::new(settings), ClusterAccumulator::absorb)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::exact::group_exact;
    use crate::models::{PublishDate, RawRecord};
    use crate::normalize::NormalizedKey;

    fn record(index: usize, title: &str, url: &str, snippet: &str) -> DigestRecord {
        DigestRecord::new(
            index,
            RawRecord::new(title, url).with_snippet(snippet),
            NormalizedKey::from_parts(url, title),
            PublishDate::Unknown,
        )
    }

    fn settings() -> ClusteringConfig {
        ClusteringConfig::default()
    }

    #[test]
    fn test_bucket_keys() {
        assert_eq!(
            bucket_keys("렌즈 행사 개최 안내"),
            vec!["렌즈", "렌즈 행사", "렌즈 행사 개최"]
        );
        assert_eq!(bucket_keys("a 렌즈 b 행사"), vec!["렌즈", "렌즈 행사"]);
        assert!(bucket_keys("").is_empty());
    }

    #[test]
    fn test_exclusive_tag_variant_merges_on_similar_snippets() {
        let snippet_a = "한국존슨앤드존슨 비전이 12일 서울에서 신제품 렌즈 출시 행사를 개최했다고 밝혔다";
        let snippet_b = "한국존슨앤드존슨 비전이 12일 서울에서 신제품 렌즈 출시 행사를 열었다고 밝혔다";
        let groups = group_exact(vec![
            record(0, "[단독] 렌즈 행사 개최", "https://a.com/1", snippet_a),
            record(1, "렌즈 행사 개최", "https://b.com/2", snippet_b),
        ]);
        assert_eq!(groups.len(), 2);

        let clusters = cluster_groups(groups, &settings());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn test_dissimilar_snippets_stay_apart() {
        let groups = group_exact(vec![
            record(0, "렌즈 행사 개최", "https://a.com/1", "서울에서 신제품 발표회가 열렸다"),
            record(1, "렌즈 행사 개최", "https://b.com/2", "부산 안경원 체인이 할인 이벤트를 시작한다"),
        ]);
        assert_eq!(cluster_groups(groups, &settings()).len(), 2);
    }

    #[test]
    fn test_no_shared_bucket_no_comparison() {
        let groups = group_exact(vec![
            record(0, "렌즈 행사 개최", "https://a.com/1", ""),
            record(1, "행사 렌즈 개최", "https://b.com/2", ""),
        ]);
        assert_eq!(cluster_groups(groups, &settings()).len(), 2);
    }

    #[test]
    fn test_title_similarity_without_snippets() {
        let groups = group_exact(vec![
            record(0, "아큐브 신제품 난시 렌즈 국내 출시", "https://a.com/1", ""),
            record(1, "아큐브 신제품 난시 렌즈 국내 정식 출시", "https://b.com/2", "스니펫만 있음"),
        ]);
        assert_eq!(cluster_groups(groups, &settings()).len(), 1);
    }

    #[test]
    fn test_title_fallback_ignores_tags() {
        let mut strict = settings();
        strict.similarity_threshold = 1.0;
        let accumulator = ClusterAccumulator::new(&strict);
        let tagged = record(0, "[단독] 아큐브 신제품 렌즈 출시 (종합)", "https://a.com/1", "");
        let plain = record(1, "아큐브 신제품 렌즈 출시", "https://b.com/2", "");
        assert_eq!(accumulator.similarity(&tagged, &plain), 1.0);

        let groups = group_exact(vec![tagged, plain]);
        assert_eq!(cluster_groups(groups, &strict).len(), 1);
    }

    #[test]
    fn test_first_matching_cluster_wins() {
        let groups = group_exact(vec![
            record(0, "렌즈 행사 개최", "https://a.com/1", ""),
            record(1, "렌즈 행사 개최 예정", "https://b.com/2", ""),
            record(2, "렌즈 행사 개최", "https://c.com/3", ""),
        ]);
        let clusters = cluster_groups(groups, &settings());
        assert_eq!(clusters.len(), 1);
        let order: Vec<usize> = clusters[0].members.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_entity_gate() {
        let mut gated = settings();
        gated.require_shared_entity = true;
        gated.entity_list = vec!["아큐브".to_string(), "쿠퍼비전".to_string()];

        let build = || {
            group_exact(vec![
                record(0, "신제품 렌즈 출시 행사", "https://a.com/1", ""),
                record(1, "신제품 렌즈 출시 행사", "https://b.com/2", ""),
                record(2, "아큐브 렌즈 출시", "https://c.com/3", ""),
                record(3, "아큐브 렌즈 출시", "https://d.com/4", ""),
            ])
        };
        assert_eq!(cluster_groups(build(), &settings()).len(), 2);
        assert_eq!(cluster_groups(build(), &gated).len(), 3);
    }

    #[test]
    fn test_threshold_edges() {
        let mut strict = settings();
        strict.similarity_threshold = 1.0;
        let groups = group_exact(vec![
            record(0, "렌즈 행사 개최", "https://a.com/1", ""),
            record(1, "렌즈 행사 개최", "https://b.com/2", ""),
            record(2, "렌즈 행사 개최 예정", "https://c.com/3", ""),
        ]);
        assert_eq!(cluster_groups(groups, &strict).len(), 2);
    }
}
