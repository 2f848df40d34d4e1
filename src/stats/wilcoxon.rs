// Wilcoxon signed-rank test for paired ordinal differences.
//
// Zero differences are dropped before ranking (the classic Wilcoxon
// treatment). The reported statistic is W = min(T+, T-), the smaller of
// the two signed rank sums. For n <= 25 with no ties among the absolute
// differences the exact null distribution is enumerated; otherwise the
// normal approximation with tie-corrected variance is used.

use super::distributions::normal_cdf;
use super::{average_ranks, tie_term};

/// Outcome of a two-sided signed-rank test.
#[derive(Debug, Clone, Copy)]
pub struct WilcoxonOutcome {
    /// W = min(T+, T-) over the non-zero differences.
    pub statistic: f64,

    /// Two-sided p-value.
    pub p_value: f64,

    /// Number of non-zero differences actually ranked.
    pub n_nonzero: usize,
}

const EXACT_LIMIT: usize = 25;

/// Two-sided Wilcoxon signed-rank test on paired differences.
///
/// Degenerate input (every difference exactly zero) short-circuits to
/// statistic 0, p = 1.0 rather than invoking an undefined test.
pub fn signed_rank(diffs: &[f64]) -> WilcoxonOutcome {
    let nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let n = nonzero.len();
    if n == 0 {
        return WilcoxonOutcome {
            statistic: 0.0,
            p_value: 1.0,
            n_nonzero: 0,
        };
    }

    let abs: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let (ranks, tie_groups) = average_ranks(&abs);

    let r_plus: f64 = nonzero
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| *r)
        .sum();
    let total = n as f64 * (n as f64 + 1.0) / 2.0;
    let r_minus = total - r_plus;
    let w = r_plus.min(r_minus);

    let has_ties = tie_groups.iter().any(|&t| t > 1);
    let p_value = if n <= EXACT_LIMIT && !has_ties {
        exact_two_sided_p(w as u64, n)
    } else {
        let nf = n as f64;
        let mean = nf * (nf + 1.0) / 4.0;
        let var = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term(&tie_groups) / 48.0;
        if var <= 0.0 {
            1.0
        } else {
            // W = min(T+, T-) is always <= its mean, so the two-sided
            // p-value doubles the lower tail.
            let z = (w - mean) / var.sqrt();
            (2.0 * normal_cdf(z)).min(1.0)
        }
    };

    WilcoxonOutcome {
        statistic: w,
        p_value,
        n_nonzero: n,
    }
}

/// Exact two-sided p-value: 2 * P(T <= w) under the null where every
/// rank 1..=n carries its sign with probability 1/2. Counts are built by
/// subset-sum dynamic programming over the (untied) ranks.
fn exact_two_sided_p(w: u64, n: usize) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }
    let total = 2.0_f64.powi(n as i32);
    let tail: f64 = counts[..=(w as usize).min(max_sum)].iter().sum();
    (2.0 * tail / total).min(1.0)
}
