// Brown-Forsythe test of variance homogeneity (Levene's test with
// median centering). Median centering makes the test robust to the
// skewed, heavy-tailed error distributions ordinal rating errors
// typically produce.

use super::distributions::f_dist_sf;
use super::{mean, median};
use anyhow::Result;

/// Outcome of a Brown-Forsythe variance-homogeneity test.
#[derive(Debug, Clone, Copy)]
pub struct LeveneOutcome {
    /// The W statistic (F-distributed under the null).
    pub statistic: f64,

    /// Upper-tail p-value from F(k-1, N-k).
    pub p_value: f64,
}

/// Brown-Forsythe test across two or more groups.
///
/// Returns an error for fewer than two groups or any group with fewer
/// than two observations (the within-group spread is undefined there).
pub fn brown_forsythe(groups: &[&[f64]]) -> Result<LeveneOutcome> {
    if groups.len() < 2 {
        anyhow::bail!("variance-homogeneity test needs at least 2 groups");
    }
    if groups.iter().any(|g| g.len() < 2) {
        anyhow::bail!("variance-homogeneity test needs at least 2 observations per group");
    }

    let k = groups.len() as f64;
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    let n_total_f = n_total as f64;

    // Absolute deviations from each group's median
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let m = median(g);
            g.iter().map(|x| (x - m).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> = deviations.iter().map(|z| mean(z)).collect();
    let grand_mean = deviations.iter().flatten().copied().sum::<f64>() / n_total_f;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, zm)| z.len() as f64 * (zm - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, zm)| z.iter().map(|v| (v - zm).powi(2)).sum::<f64>())
        .sum();

    if within <= 0.0 {
        // Identical spread in every group: nothing to reject.
        let statistic = if between > 0.0 { f64::INFINITY } else { 0.0 };
        let p_value = if between > 0.0 { 0.0 } else { 1.0 };
        return Ok(LeveneOutcome { statistic, p_value });
    }

    let statistic = ((n_total_f - k) / (k - 1.0)) * between / within;
    let p_value = f_dist_sf(statistic, k - 1.0, n_total_f - k);

    Ok(LeveneOutcome { statistic, p_value })
}
