//! String similarity measures for fuzzy team-name matching.
//!
//! All measures return a ratio in `[0, 1]` where `1.0` means identical, and
//! all are symmetric in their arguments. Inputs are compared case-insensitively.

use surebet_core::SimilarityMetric;

/// Similarity of two names under `metric`.
#[must_use]
pub fn similarity(metric: SimilarityMetric, a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    // Jaro's greedy character matching depends on argument order; fix it.
    let (a, b) = if a <= b { (a, b) } else { (b, a) };

    match metric {
        SimilarityMetric::Indel => indel_ratio(&a, &b),
        SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(&a, &b),
        SimilarityMetric::JaroWinkler => strsim::jaro_winkler(&a, &b),
        SimilarityMetric::SorensenDice => strsim::sorensen_dice(&a, &b),
    }
}

/// Indel similarity: `2 * LCS(a, b) / (|a| + |b|)`.
///
/// Equivalent to `1 - d / (|a| + |b|)` where `d` is the edit distance with
/// insertions and deletions only, so a substitution costs two edits. Under
/// this measure `"fc barcelona"` and `"barcelona"` score `18 / 21`.
#[must_use]
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    (2 * longest_common_subsequence(&a, &b)) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    // Iterate the longer string in the outer loop; the row is sized to the shorter.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for &x in outer {
        for (j, &y) in inner.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}
