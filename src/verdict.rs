//! Scenario classification from the corrected confirmatory battery.

use serde::{Deserialize, Serialize};

/// Pre-registered interpretation bands over the number of confirmatory
/// rejections. The boundaries are part of the analysis design: zero
/// rejections reads as no detectable bias, three or more as systematic
/// bias, anything between as context-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    /// No confirmatory test rejected its null.
    NoDetectableBias,
    /// Three or more of the five tests rejected.
    BiasDetected,
    /// One or two rejections: evidence exists but is not systematic.
    MixedContextDependent,
}

impl Scenario {
    /// Classify a battery outcome by its rejection count.
    pub fn classify(n_significant: usize) -> Self {
        match n_significant {
            0 => Self::NoDetectableBias,
            n if n >= 3 => Self::BiasDetected,
            _ => Self::MixedContextDependent,
        }
    }

    /// One-line narrative for the text report.
    pub fn narrative(&self) -> &'static str {
        match self {
            Self::NoDetectableBias => {
                "No detectable systematic divergence between the two rating methods."
            }
            Self::BiasDetected => {
                "Systematic divergence detected: the direct-inference method disagrees \
                 with the independent second pass beyond what chance explains."
            }
            Self::MixedContextDependent => {
                "Mixed evidence: some tests reject, but the pattern is context-dependent \
                 rather than systematic."
            }
        }
    }

    /// Short identifier used in the persisted artifact.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoDetectableBias => "no-detectable-bias",
            Self::BiasDetected => "bias-detected",
            Self::MixedContextDependent => "mixed-context-dependent",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(Scenario::classify(0), Scenario::NoDetectableBias);
        assert_eq!(Scenario::classify(1), Scenario::MixedContextDependent);
        assert_eq!(Scenario::classify(2), Scenario::MixedContextDependent);
        assert_eq!(Scenario::classify(3), Scenario::BiasDetected);
        assert_eq!(Scenario::classify(5), Scenario::BiasDetected);
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(Scenario::NoDetectableBias.to_string(), "no-detectable-bias");
        assert_eq!(Scenario::BiasDetected.to_string(), "bias-detected");
        assert_eq!(
            Scenario::MixedContextDependent.to_string(),
            "mixed-context-dependent"
        );
    }

    #[test]
    fn test_narratives_mention_direction() {
        assert!(Scenario::BiasDetected.narrative().contains("Systematic"));
        assert!(Scenario::NoDetectableBias.narrative().contains("No detectable"));
    }
}
