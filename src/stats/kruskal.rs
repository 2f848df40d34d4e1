// Kruskal-Wallis omnibus rank test across two or more independent
// groups, with tie-corrected H and a chi-square(k-1) null.

use super::distributions::chi_square_sf;
use super::{average_ranks, tie_term};
use anyhow::Result;

/// Outcome of a Kruskal-Wallis test.
#[derive(Debug, Clone, Copy)]
pub struct KruskalOutcome {
    /// Tie-corrected H statistic.
    pub statistic: f64,

    /// Upper-tail p-value from chi-square(k-1).
    pub p_value: f64,
}

/// Kruskal-Wallis H test over the given groups.
pub fn kruskal_wallis(groups: &[Vec<f64>]) -> Result<KruskalOutcome> {
    if groups.len() < 2 {
        anyhow::bail!("omnibus rank test needs at least 2 groups");
    }
    if groups.iter().any(|g| g.is_empty()) {
        anyhow::bail!("omnibus rank test needs non-empty groups");
    }

    let combined: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = combined.len() as f64;
    let (ranks, tie_groups) = average_ranks(&combined);

    let mut h = 0.0;
    let mut offset = 0;
    for group in groups {
        let len = group.len();
        let rank_sum: f64 = ranks[offset..offset + len].iter().sum();
        h += rank_sum * rank_sum / len as f64;
        offset += len;
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_term(&tie_groups) / (n * n * n - n);
    if correction <= 0.0 {
        // Every observation identical: no rank variation to test.
        return Ok(KruskalOutcome {
            statistic: 0.0,
            p_value: 1.0,
        });
    }
    let statistic = h / correction;
    let p_value = chi_square_sf(statistic, groups.len() as f64 - 1.0);

    Ok(KruskalOutcome { statistic, p_value })
}
