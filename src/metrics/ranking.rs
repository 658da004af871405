//! Reference learning-to-rank metrics.

use ndarray::ArrayView1;

use super::{rank_by_score, Metric};

/// Number of ranked positions a cutoff keeps for a query of `n_docs`.
#[inline]
fn effective_cutoff(cutoff: Option<usize>, n_docs: usize) -> usize {
    cutoff.map_or(n_docs, |k| k.min(n_docs))
}

/// Exponential gain: `2^rel - 1`.
#[inline]
fn gain(relevance: f32) -> f64 {
    2f64.powf(relevance as f64) - 1.0
}

/// Logarithmic discount for a 1-based rank: `log2(rank + 1)`.
#[inline]
fn discount(rank: usize) -> f64 {
    (rank as f64 + 1.0).log2()
}

fn dcg(gains: impl Iterator<Item = f64>, k: usize) -> f64 {
    gains
        .take(k)
        .enumerate()
        .map(|(i, g)| g / discount(i + 1))
        .sum()
}

// ============================================================================
// NDCG
// ============================================================================

/// Normalized Discounted Cumulative Gain.
///
/// ```text
/// DCG@k  = Σ_{i=1..k} (2^rel_i - 1) / log2(i + 1)
/// NDCG@k = DCG@k / IDCG@k
/// ```
///
/// Queries without any relevant document score `no_relevant_results`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ndcg {
    /// Number of top positions considered, `None` for the whole list.
    pub cutoff: Option<usize>,
    pub no_relevant_results: f64,
}

impl Ndcg {
    /// NDCG truncated at `cutoff`.
    pub fn at(cutoff: usize) -> Self {
        Self {
            cutoff: Some(cutoff),
            ..Self::default()
        }
    }
}

impl Default for Ndcg {
    fn default() -> Self {
        Self {
            cutoff: None,
            no_relevant_results: 1.0,
        }
    }
}

impl Metric for Ndcg {
    fn name(&self) -> String {
        match self.cutoff {
            Some(k) => format!("NDCG@{k}"),
            None => "NDCG".to_string(),
        }
    }

    fn eval_query(&self, labels: ArrayView1<'_, f32>, scores: ArrayView1<'_, f64>) -> f64 {
        let k = effective_cutoff(self.cutoff, labels.len());

        let mut ideal: Vec<f32> = labels.to_vec();
        ideal.sort_by(|a, b| b.total_cmp(a));
        let idcg = dcg(ideal.into_iter().map(gain), k);
        if idcg <= 0.0 {
            return self.no_relevant_results;
        }

        let order = rank_by_score(scores);
        dcg(order.into_iter().map(|doc| gain(labels[doc])), k) / idcg
    }
}

// ============================================================================
// Precision
// ============================================================================

/// Fraction of relevant documents (`label > threshold`) among the top
/// `cutoff` positions.
///
/// Queries shorter than the cutoff divide by their length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Precision {
    pub cutoff: Option<usize>,
    pub threshold: f32,
}

impl Precision {
    pub fn at(cutoff: usize) -> Self {
        Self {
            cutoff: Some(cutoff),
            threshold: 0.0,
        }
    }
}

impl Metric for Precision {
    fn name(&self) -> String {
        match self.cutoff {
            Some(k) => format!("P@{k}"),
            None => "P".to_string(),
        }
    }

    fn eval_query(&self, labels: ArrayView1<'_, f32>, scores: ArrayView1<'_, f64>) -> f64 {
        let k = effective_cutoff(self.cutoff, labels.len());
        if k == 0 {
            return 0.0;
        }

        let relevant = rank_by_score(scores)
            .into_iter()
            .take(k)
            .filter(|&doc| labels[doc] > self.threshold)
            .count();
        relevant as f64 / k as f64
    }
}

// ============================================================================
// Reciprocal Rank
// ============================================================================

/// `1 / rank` of the first relevant document (`label > threshold`), 0 if
/// the query has none. Its mean over queries is MRR.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReciprocalRank {
    pub threshold: f32,
}

impl Metric for ReciprocalRank {
    fn name(&self) -> String {
        "MRR".to_string()
    }

    fn eval_query(&self, labels: ArrayView1<'_, f32>, scores: ArrayView1<'_, f64>) -> f64 {
        rank_by_score(scores)
            .into_iter()
            .position(|doc| labels[doc] > self.threshold)
            .map_or(0.0, |i| 1.0 / (i + 1) as f64)
    }
}
