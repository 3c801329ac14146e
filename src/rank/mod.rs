//! Path ranking by usage frequency and recency

use crate::domain::{QuotaRecord, RecentPathList};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Weights for combining the two ranking signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    pub frequency: f64,
    pub recency: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self { frequency: 0.6, recency: 0.4 }
    }
}

pub fn recommended_paths(
    history: &[QuotaRecord],
    recent: &RecentPathList,
    max_count: usize,
) -> Vec<String> {
    recommended_paths_with_weights(history, recent, max_count, RankingWeights::default())
}

/// Top `max_count` previously seen paths, best first. Scores stay internal.
pub fn recommended_paths_with_weights(
    history: &[QuotaRecord],
    recent: &RecentPathList,
    max_count: usize,
    weights: RankingWeights,
) -> Vec<String> {
    score_paths(history, recent, weights).into_iter().take(max_count).map(|(path, _)| path).collect()
}

fn score_paths(
    history: &[QuotaRecord],
    recent: &RecentPathList,
    weights: RankingWeights,
) -> Vec<(String, f64)> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for record in history {
        let path = record.source_path().as_str();
        if !path.is_empty() {
            *frequency.entry(path).or_default() += 1;
        }
    }

    let Some(max_frequency) = frequency.values().copied().max() else {
        return Vec::new();
    };

    let mut scored: Vec<(String, f64)> = frequency
        .into_iter()
        .map(|(path, count)| {
            let normalized = count as f64 / max_frequency as f64;
            let score = weights.frequency * normalized + weights.recency * recency_bonus(path, recent);
            (path.to_string(), score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    scored
}

/// `1 - index / len` for a path in the recent list, 0 otherwise.
fn recency_bonus(path: &str, recent: &RecentPathList) -> f64 {
    match recent.position(path) {
        Some(index) => 1.0 - index as f64 / recent.len() as f64,
        None => 0.0,
    }
}
