//! Best-effort recovery of per-label SSR-on-human-text predictions.
//!
//! The SSR cross-condition test and the confidence comparison need a
//! dataset no single artifact is guaranteed to carry. Recovery is a
//! chain of named strategies tried in order; each either resolves the
//! dataset or returns a typed not-found with a reason, and the chain
//! records every failed attempt so the skip reason in the report names
//! exactly what was tried.

use crate::input::{resolve_prediction, AblationArtifact};
use serde_json::Value;
use std::collections::HashMap;

/// Per-label SSR correctness and confidences on human-authored text.
#[derive(Debug, Clone)]
pub struct SsrHumanSet {
    /// Name of the strategy that produced this set.
    pub strategy: &'static str,

    pub exact_by_label: HashMap<String, bool>,

    /// Self-reported confidences where the records carried them.
    pub confidences: Vec<f64>,
}

/// Typed not-found result from one strategy.
#[derive(Debug, Clone)]
pub struct NotFound {
    pub reason: String,
}

/// One failed strategy attempt, kept for the report's skip reason.
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    pub strategy: &'static str,
    pub reason: String,
}

/// Outcome of the full recovery chain.
#[derive(Debug, Clone)]
pub enum RecoveryOutcome {
    Resolved(SsrHumanSet),
    Unavailable { attempts: Vec<FailedAttempt> },
}

impl RecoveryOutcome {
    pub fn resolved(&self) -> Option<&SsrHumanSet> {
        match self {
            Self::Resolved(set) => Some(set),
            Self::Unavailable { .. } => None,
        }
    }

    /// Human-readable summary of why recovery failed.
    pub fn failure_summary(&self) -> Option<String> {
        match self {
            Self::Resolved(_) => None,
            Self::Unavailable { attempts } => Some(
                attempts
                    .iter()
                    .map(|a| format!("{}: {}", a.strategy, a.reason))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

/// Auxiliary artifacts the strategies may draw from.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxSources<'a> {
    pub cross_validation: Option<&'a Value>,
    pub ablation: Option<&'a AblationArtifact>,
}

trait RecoveryStrategy {
    fn name(&self) -> &'static str;
    fn attempt(&self, sources: &AuxSources<'_>) -> Result<SsrHumanSet, NotFound>;
}

/// Cross-validation summaries are tried first, but they typically hold
/// only fold-level aggregates. The strategy probes for any per-case
/// array and resolves what it finds; fold-only artifacts come back as a
/// typed not-found.
struct CrossValidationStrategy;

const PER_CASE_KEYS: &[&str] = &["perCase", "details", "results"];

impl RecoveryStrategy for CrossValidationStrategy {
    fn name(&self) -> &'static str {
        "cross-validation"
    }

    fn attempt(&self, sources: &AuxSources<'_>) -> Result<SsrHumanSet, NotFound> {
        let Some(doc) = sources.cross_validation else {
            return Err(NotFound {
                reason: "no cross-validation artifact supplied".to_string(),
            });
        };
        let Some(obj) = doc.as_object() else {
            return Err(NotFound {
                reason: "cross-validation artifact is not a JSON object".to_string(),
            });
        };

        let records = PER_CASE_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array));
        let Some(records) = records else {
            return Err(NotFound {
                reason: "cross-validation artifact has no per-case predictions".to_string(),
            });
        };

        build_set(self.name(), records.iter())
    }
}

/// Second choice: the ablation artifact's asymmetric condition, which
/// evaluates SSR on human-authored text with per-case records.
struct AblationConditionStrategy;

impl RecoveryStrategy for AblationConditionStrategy {
    fn name(&self) -> &'static str {
        "ablation-conditions"
    }

    fn attempt(&self, sources: &AuxSources<'_>) -> Result<SsrHumanSet, NotFound> {
        let Some(ablation) = sources.ablation else {
            return Err(NotFound {
                reason: "no ablation artifact supplied".to_string(),
            });
        };

        let condition = ablation
            .conditions
            .iter()
            .find(|c| is_asymmetric_condition(&c.name));
        let Some(condition) = condition else {
            return Err(NotFound {
                reason: "no asymmetric condition found in ablation artifact".to_string(),
            });
        };

        if condition.predictions.is_empty() {
            return Err(NotFound {
                reason: format!(
                    "condition '{}' has no per-case predictions",
                    condition.name
                ),
            });
        }

        let mut exact_by_label = HashMap::new();
        let mut confidences = Vec::new();
        for p in &condition.predictions {
            exact_by_label.insert(p.label.clone(), p.exact());
            if let Some(conf) = p.confidence {
                confidences.push(conf);
            }
        }
        Ok(SsrHumanSet {
            strategy: self.name(),
            exact_by_label,
            confidences,
        })
    }
}

/// The asymmetric condition carries the SSR-on-human-text evaluation.
/// Producers label it "H3" or some spelling of "asymmetric".
pub fn is_asymmetric_condition(name: &str) -> bool {
    name.contains("H3") || name.to_lowercase().contains("asymm")
}

fn build_set<'a>(
    strategy: &'static str,
    records: impl Iterator<Item = &'a Value>,
) -> Result<SsrHumanSet, NotFound> {
    let mut exact_by_label = HashMap::new();
    let mut confidences = Vec::new();
    for record in records {
        if let Some(p) = resolve_prediction(record) {
            exact_by_label.insert(p.label.clone(), p.exact());
            if let Some(conf) = p.confidence {
                confidences.push(conf);
            }
        }
    }
    if exact_by_label.is_empty() {
        return Err(NotFound {
            reason: "per-case records present but none were resolvable".to_string(),
        });
    }
    Ok(SsrHumanSet {
        strategy,
        exact_by_label,
        confidences,
    })
}

/// Run the recovery chain in order, returning the first resolved set or
/// the full list of failed attempts.
pub fn resolve_ssr_on_human(sources: &AuxSources<'_>) -> RecoveryOutcome {
    let strategies: [&dyn RecoveryStrategy; 2] =
        [&CrossValidationStrategy, &AblationConditionStrategy];

    let mut attempts = Vec::new();
    for strategy in strategies {
        match strategy.attempt(sources) {
            Ok(set) => {
                tracing::info!(
                    strategy = strategy.name(),
                    labels = set.exact_by_label.len(),
                    "recovered SSR-on-human predictions"
                );
                return RecoveryOutcome::Resolved(set);
            }
            Err(not_found) => {
                tracing::debug!(
                    strategy = strategy.name(),
                    reason = %not_found.reason,
                    "recovery strategy failed"
                );
                attempts.push(FailedAttempt {
                    strategy: strategy.name(),
                    reason: not_found.reason,
                });
            }
        }
    }
    RecoveryOutcome::Unavailable { attempts }
}
