// Statistical primitives for the confirmatory battery and the
// exploratory analyses.
//
// Scientific Foundation:
// - Wilcoxon signed-rank, McNemar, Brown-Forsythe, Kruskal-Wallis and
//   Mann-Whitney are the pre-registered test families; each lives in its
//   own file with its sampling distribution handled in distributions.rs.
// - Holm step-down correction controls the family-wise error rate over
//   the five confirmatory p-values (Holm 1979).
//
// Descriptive helpers deliberately use population variance/sd (divide by
// n): the report consumers recompute these values from the raw vectors
// and the persisted artifact must match them bit-for-bit.

pub mod distributions;
mod holm;
mod kruskal;
mod levene;
mod mann_whitney;
mod mcnemar;
mod wilcoxon;

pub use holm::{correct_family, holm_adjust, CorrectionOutcome};
pub use kruskal::{kruskal_wallis, KruskalOutcome};
pub use levene::{brown_forsythe, LeveneOutcome};
pub use mann_whitney::{mann_whitney_u, MannWhitneyOutcome};
pub use mcnemar::{mcnemar, ContingencyTable, McnemarOutcome};
pub use wilcoxon::{signed_rank, WilcoxonOutcome};

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divide by n).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n).
pub fn population_sd(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Median via sort; average of the two central elements for even length.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Average ranks (1-based) with ties sharing their mean rank, plus the
/// size of every tie group (needed for the variance corrections of the
/// rank tests).
pub fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut tie_groups = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Ranks i+1 ..= j+1 share the average rank
        let avg = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        tie_groups.push(j - i + 1);
        i = j + 1;
    }
    (ranks, tie_groups)
}

/// Tie-correction term sum(t^3 - t) over tie group sizes.
pub fn tie_term(tie_groups: &[usize]) -> f64 {
    tie_groups
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}
