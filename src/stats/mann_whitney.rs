// Mann-Whitney U rank-sum test for two unpaired samples, two-sided,
// using the normal approximation with tie and continuity corrections.

use super::distributions::two_sided_normal_p;
use super::{average_ranks, tie_term};
use anyhow::Result;

/// Outcome of a two-sided Mann-Whitney U test.
#[derive(Debug, Clone, Copy)]
pub struct MannWhitneyOutcome {
    /// U statistic for the first sample.
    pub statistic: f64,

    /// Two-sided p-value.
    pub p_value: f64,
}

/// Two-sided Mann-Whitney U test comparing two independent samples.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<MannWhitneyOutcome> {
    if x.is_empty() || y.is_empty() {
        anyhow::bail!("rank-sum test needs non-empty samples");
    }

    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let n = n1 + n2;

    let combined: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let (ranks, tie_groups) = average_ranks(&combined);

    let rank_sum_x: f64 = ranks[..x.len()].iter().sum();
    let u1 = rank_sum_x - n1 * (n1 + 1.0) / 2.0;

    let mean = n1 * n2 / 2.0;
    let tie_adjust = tie_term(&tie_groups) / (n * (n - 1.0));
    let var = n1 * n2 / 12.0 * ((n + 1.0) - tie_adjust);

    let p_value = if var <= 0.0 {
        1.0
    } else {
        // Continuity correction toward the mean
        let delta = u1 - mean;
        let corrected = delta.abs() - 0.5;
        let z = corrected.max(0.0) / var.sqrt();
        two_sided_normal_p(z)
    };

    Ok(MannWhitneyOutcome {
        statistic: u1,
        p_value,
    })
}
