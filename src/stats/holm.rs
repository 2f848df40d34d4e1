// Holm step-down correction for family-wise error rate control.
//
// Sort the raw p-values ascending, multiply the i-th smallest by the
// remaining family size (m - i), enforce monotonicity with a running
// maximum, cap at 1.0, and map the adjusted values back to the original
// test identities. Reject exactly the hypotheses whose adjusted p-value
// is <= alpha; the running maximum makes this equivalent to the classic
// "reject until the first failure" step-down rule.
//
// When multiple-comparison support is disabled via the capability
// object, the family degrades to raw-p thresholding at alpha. That is a
// reduced-rigor fallback, not a silent pass, so it logs a warning.

use crate::config::StatCapabilities;

/// Adjusted p-values and reject decisions, index-aligned with the input
/// family order.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    pub adjusted: Vec<f64>,
    pub reject: Vec<bool>,

    /// False when the degraded uncorrected fallback was taken.
    pub corrected: bool,
}

/// Holm-Bonferroni step-down adjustment over one hypothesis family.
pub fn holm_adjust(p_values: &[f64], alpha: f64) -> CorrectionOutcome {
    let m = p_values.len();
    if m == 0 {
        return CorrectionOutcome {
            adjusted: Vec::new(),
            reject: Vec::new(),
            corrected: true,
        };
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut adjusted = vec![0.0; m];
    let mut running_max = 0.0_f64;
    for (rank, &idx) in order.iter().enumerate() {
        let factor = (m - rank) as f64;
        let candidate = (p_values[idx] * factor).min(1.0);
        running_max = running_max.max(candidate);
        adjusted[idx] = running_max;
    }

    let reject = adjusted.iter().map(|&p| p <= alpha).collect();
    CorrectionOutcome {
        adjusted,
        reject,
        corrected: true,
    }
}

/// Correct a family of raw p-values, honoring the capability object.
/// Without multiple-comparison support each raw p-value is treated as
/// already adjusted and thresholded at alpha directly.
pub fn correct_family(
    p_values: &[f64],
    alpha: f64,
    capabilities: &StatCapabilities,
) -> CorrectionOutcome {
    if capabilities.multiple_comparison {
        holm_adjust(p_values, alpha)
    } else {
        tracing::warn!(
            "multiple-comparison support disabled; thresholding raw p-values at alpha={} \
             without family-wise correction",
            alpha
        );
        CorrectionOutcome {
            adjusted: p_values.to_vec(),
            reject: p_values.iter().map(|&p| p < alpha).collect(),
            corrected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holm_known_family() {
        // Sorted ascending: 0.01*5, 0.02*4, 0.03*3, 0.04*2, 0.05*1
        // with the running maximum applied.
        let out = holm_adjust(&[0.01, 0.02, 0.03, 0.04, 0.05], 0.05);
        let expected = [0.05, 0.08, 0.09, 0.09, 0.09];
        for (got, want) in out.adjusted.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert_eq!(out.reject, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_adjusted_at_least_raw_and_capped() {
        let raw = [0.001, 0.9, 0.5, 0.04, 0.3];
        let out = holm_adjust(&raw, 0.05);
        for (r, a) in raw.iter().zip(&out.adjusted) {
            assert!(a >= r);
            assert!(*a <= 1.0);
        }
    }

    #[test]
    fn test_monotone_in_raw_order() {
        let raw = [0.04, 0.001, 0.3, 0.9, 0.02];
        let out = holm_adjust(&raw, 0.05);
        let mut indexed: Vec<(f64, f64)> =
            raw.iter().copied().zip(out.adjusted.iter().copied()).collect();
        indexed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in indexed.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_step_down_stops_at_first_failure() {
        // 0.002 <= 0.05/3 survives; 0.03 > 0.05/2 fails the step-down,
        // so 0.04 must not be rejected either despite being below alpha.
        let out = holm_adjust(&[0.002, 0.04, 0.03], 0.05);
        assert!(out.reject[0]);
        assert!(!out.reject[1]);
        assert!(!out.reject[2]);
    }

    #[test]
    fn test_all_neutral_family() {
        let out = holm_adjust(&[1.0, 1.0, 1.0], 0.05);
        assert!(out.adjusted.iter().all(|&p| p == 1.0));
        assert!(out.reject.iter().all(|&r| !r));
    }

    #[test]
    fn test_empty_family() {
        let out = holm_adjust(&[], 0.05);
        assert!(out.adjusted.is_empty());
        assert!(out.reject.is_empty());
    }

    #[test]
    fn test_degraded_fallback_uses_raw_threshold() {
        let caps = StatCapabilities {
            multiple_comparison: false,
            ..StatCapabilities::default()
        };
        let out = correct_family(&[0.02, 0.04, 0.2], 0.05, &caps);
        assert!(!out.corrected);
        assert_eq!(out.adjusted, vec![0.02, 0.04, 0.2]);
        assert_eq!(out.reject, vec![true, true, false]);
    }

    #[test]
    fn test_full_capability_applies_holm() {
        let caps = StatCapabilities::default();
        let out = correct_family(&[0.02, 0.04, 0.2], 0.05, &caps);
        assert!(out.corrected);
        // 0.02 * 3 = 0.06 > 0.05: nothing survives
        assert!(out.reject.iter().all(|&r| !r));
    }
}
