//! String similarity ratios in `[0, 1]`.
//!
//! The default metric is the gestalt (Ratcliff/Obershelp) ratio: twice the
//! number of characters covered by recursively found longest common blocks,
//! divided by the combined length. The other metrics delegate to `strsim`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Gestalt,
    NormalizedLevenshtein,
    JaroWinkler,
    SorensenDice,
}

impl SimilarityMetric {
    /// Inputs are put in a fixed order first so every metric is symmetric,
    /// including block matching, which prefers the leftmost block on ties.
    pub fn score(self, a: &str, b: &str) -> f64 {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        match self {
            SimilarityMetric::Gestalt => gestalt_ratio(a, b),
            SimilarityMetric::NormalizedLevenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(a, b),
        }
    }
}

/// Gestalt similarity with the default metric.
pub fn similarity(a: &str, b: &str) -> f64 {
    SimilarityMetric::Gestalt.score(a, b)
}

/// Raw gestalt ratio. Not symmetric on its own; go through
/// [`SimilarityMetric::score`] or [`similarity`] for that.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let first: Vec<char> = a.chars().collect();
    let second: Vec<char> = b.chars().collect();

    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&first, &second) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common run as `(start_a, start_b, len)`, earliest in `a` then `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    if a.is_empty() || b.is_empty() {
        return best;
    }

    // prev[j + 1] = length of the common run ending at a[i - 1], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let run = curr[j + 1];
            if run > best.2 {
                best = (i + 1 - run, j + 1 - run, run);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        assert_eq!(similarity("tardigrade", "tardigrade"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        // one block "bcd": 2 * 3 / 8
        assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        // "tardigrade" vs "tardigrades": 10 matched of 21
        assert!((similarity("tardigrade", "tardigrades") - 20.0 / 21.0).abs() < 1e-9);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("water bear", "bear water"),
            ("cryptobiosis", "anhydrobiosis"),
            ("qabxcd", "abycdf"),
            ("extreme", "extremophile"),
        ];
        for (a, b) in pairs {
            for metric in [
                SimilarityMetric::Gestalt,
                SimilarityMetric::NormalizedLevenshtein,
                SimilarityMetric::JaroWinkler,
                SimilarityMetric::SorensenDice,
            ] {
                assert_eq!(metric.score(a, b), metric.score(b, a), "{metric:?} {a} / {b}");
            }
        }
    }

    #[test]
    fn test_metrics_stay_in_range() {
        for metric in [
            SimilarityMetric::NormalizedLevenshtein,
            SimilarityMetric::JaroWinkler,
            SimilarityMetric::SorensenDice,
        ] {
            let score = metric.score("desiccation", "dessication");
            assert!((0.0..=1.0).contains(&score));
            assert!(score > 0.8);
        }
    }
}
