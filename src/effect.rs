//! Effect-size utilities for the rank-based paired tests.

/// Rank-biserial correlation from a signed-rank statistic.
///
/// `r = 1 - 2W / (n(n+1)/2)` where `W` is the smaller signed rank sum
/// and `n` the number of non-zero differences. Bounded in [-1, 1] and
/// exactly 0 when no non-zero differences exist.
pub fn rank_biserial(w_statistic: f64, n_nonzero: usize) -> f64 {
    let max_w = n_nonzero as f64 * (n_nonzero as f64 + 1.0) / 2.0;
    if max_w == 0.0 {
        return 0.0;
    }
    (1.0 - (2.0 * w_statistic) / max_w).clamp(-1.0, 1.0)
}
