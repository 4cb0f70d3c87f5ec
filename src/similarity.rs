//! Normalized string similarity in `[0, 1]`.
//!
//! The default metric is a longest-common-subsequence ratio over characters,
//! `2 * lcs / (len(a) + len(b))`, which tolerates inserted tags and reordered
//! clauses better than edit distance on Korean headlines. Edit-distance and
//! Jaro-Winkler variants from `strsim` are available for tuning.

use crate::normalize::normalize_text;
use serde::{Deserialize, Serialize};

/// Which ratio the clustering engine scores candidate pairs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Lcs,
    Levenshtein,
    JaroWinkler,
}

impl SimilarityMetric {
    /// Score two texts after lowercasing and whitespace collapsing.
    ///
    /// Returns `0.0` when either side is empty; never fails.
    pub fn ratio(self, a: &str, b: &str) -> f64 {
        let a = normalize_text(a);
        let b = normalize_text(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        match self {
            SimilarityMetric::Lcs => lcs_ratio(&a, &b),
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(&a, &b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(&a, &b),
        }
    }
}

/// Longest-common-subsequence ratio over Unicode scalar values.
pub fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Two rolling rows over the shorter side.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}
