//! Clustering evaluation metrics.
//!
//! Compare predicted labels with ground truth. All measures are invariant to
//! relabelling, since spectral clustering only fixes labels up to permutation.
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`ari`] | [-1, 1] | 1 | Adjusted for chance; 0 = random |
//! | [`nmi`] | [0, 1] | 1 | Information-theoretic |
//! | [`purity`] | [0, 1] | 1 | Simple, biased toward many clusters |
//! | [`same_partition`] | bool | true | Exact agreement up to relabelling |
//!
//! # Example
//!
//! ```rust
//! use fiedler::metrics::{ari, nmi, purity};
//!
//! let pred = [0, 0, 1, 1, 2, 2];
//! let truth = [0, 0, 0, 1, 1, 1];
//!
//! assert!(ari(&pred, &truth) < 1.0);
//! assert!(nmi(&pred, &truth) > 0.0);
//! assert!((purity(&pred, &truth) - 4.0 / 6.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use std::collections::HashMap;

/// Normalized Mutual Information between two clusterings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 0 for mismatched or empty inputs and 1 when both are constant.
///
/// ```rust
/// use fiedler::metrics::nmi;
///
/// assert!((nmi(&[0, 0, 1, 1], &[1, 1, 0, 0]) - 1.0).abs() < 1e-12);
/// assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]) < 0.5);
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len() as f64;
    let joint = contingency_table(pred, truth);
    let p_pred = counts(pred);
    let p_truth = counts(truth);

    let h_pred = entropy(p_pred.values().copied(), n);
    let h_truth = entropy(p_truth.values().copied(), n);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n;
        let p_p = p_pred[&p] as f64 / n;
        let p_t = p_truth[&t] as f64 / n;
        mi += p_joint * (p_joint / (p_p * p_t)).ln();
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        (2.0 * mi / denom).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Adjusted Rand Index between two clusterings.
///
/// 1 = identical partitions, ≈0 = chance agreement. Returns 0 for mismatched or
/// empty inputs.
///
/// ```rust
/// use fiedler::metrics::ari;
///
/// assert!((ari(&[0, 0, 1, 1], &[1, 1, 0, 0]) - 1.0).abs() < 1e-12);
/// ```
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = contingency_table(pred, truth);
    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c)).sum();
    let sum_comb_a: f64 = counts(pred).values().map(|&a| comb2(a)).sum();
    let sum_comb_b: f64 = counts(truth).values().map(|&b| comb2(b)).sum();
    let comb_n = comb2(pred.len());
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        // both partitions trivial (all-in-one or all-singletons)
        return if same_partition(pred, truth) { 1.0 } else { 0.0 };
    }

    (sum_comb_ij - expected) / denom
}

/// Fraction of points whose cluster's majority ground-truth class matches theirs.
///
/// Purity is 1.0 when every point is its own cluster. Use with caution.
pub fn purity(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let mut cluster_maxes: HashMap<usize, usize> = HashMap::new();
    for (&(p, _), &count) in &contingency_table(pred, truth) {
        let current_max = cluster_maxes.entry(p).or_insert(0);
        *current_max = (*current_max).max(count);
    }

    let correct: usize = cluster_maxes.values().sum();
    correct as f64 / pred.len() as f64
}

/// Whether two labelings describe the same partition, ignoring label values.
pub fn same_partition(a: &[usize], b: &[usize]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut forward: HashMap<usize, usize> = HashMap::new();
    let mut backward: HashMap<usize, usize> = HashMap::new();
    a.iter().zip(b).all(|(&x, &y)| {
        *forward.entry(x).or_insert(y) == y && *backward.entry(y).or_insert(x) == x
    })
}

fn contingency_table(pred: &[usize], truth: &[usize]) -> HashMap<(usize, usize), usize> {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn counts(labels: &[usize]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0) += 1;
    }
    counts
}

fn entropy(counts: impl Iterator<Item = usize>, n: f64) -> f64 {
    counts
        .map(|c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

fn comb2(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n * (n - 1) / 2) as f64
    }
}
