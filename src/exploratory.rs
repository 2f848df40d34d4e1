//! Exploratory analyses reported alongside the confirmatory battery.
//!
//! Nothing here participates in the Holm family; these are descriptive
//! slices and unadjusted omnibus tests meant to suggest where any
//! divergence concentrates, not to confirm it.

use crate::input::DomainSummary;
use crate::observations::ObservationSet;
use crate::recovery::RecoveryOutcome;
use crate::stats::{kruskal_wallis, mann_whitney_u, mean, median, population_sd};
use serde::Serialize;
use std::collections::BTreeMap;

/// Descriptives for one persona's absolute rating divergences.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaGroup {
    pub n: usize,
    pub mean_abs_divergence: f64,
    pub median_abs_divergence: f64,
}

/// E1: does absolute rating divergence vary by persona?
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDivergence {
    pub groups: BTreeMap<String, PersonaGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_raw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// E2: per-domain view joining the externally computed summaries with
/// observed case counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainBreakdown {
    pub n: usize,
    pub llm_exact: f64,
    pub ssr_exact: f64,
    pub mean_divergence: f64,
}

/// E3: signed error descriptives at one observed target level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLevelErrors {
    pub n: usize,
    pub llm_mean_error: f64,
    pub llm_sd_error: f64,
    pub ssr_mean_error: f64,
    pub ssr_sd_error: f64,
}

/// E4: SSR confidence on generated text, optionally compared against
/// the recovered confidences on human-authored text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceComparison {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub median: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_text_n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_text_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_raw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// All exploratory sections of one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploratorySection {
    pub persona_divergence: PersonaDivergence,
    pub domain_breakdown: BTreeMap<String, DomainBreakdown>,
    pub errors_by_target_level: BTreeMap<String, TargetLevelErrors>,
    pub ssr_confidence: ConfidenceComparison,
}

/// E1: Kruskal-Wallis on |llm - ssr| grouped by persona.
pub fn persona_divergence(observations: &ObservationSet) -> PersonaDivergence {
    let mut by_persona: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for case in observations.cases() {
        by_persona
            .entry(case.persona_id.clone())
            .or_default()
            .push((case.llm_rating - case.ssr_rating).abs());
    }

    let groups: BTreeMap<String, PersonaGroup> = by_persona
        .iter()
        .map(|(persona, values)| {
            (
                persona.clone(),
                PersonaGroup {
                    n: values.len(),
                    mean_abs_divergence: mean(values),
                    median_abs_divergence: median(values),
                },
            )
        })
        .collect();

    if by_persona.len() < 2 {
        return PersonaDivergence {
            groups,
            statistic: None,
            p_raw: None,
            note: Some("fewer than two personas; omnibus test not run".to_string()),
        };
    }

    let samples: Vec<Vec<f64>> = by_persona.into_values().collect();
    match kruskal_wallis(&samples) {
        Ok(outcome) => PersonaDivergence {
            groups,
            statistic: Some(outcome.statistic),
            p_raw: Some(outcome.p_value),
            note: None,
        },
        Err(e) => PersonaDivergence {
            groups,
            statistic: None,
            p_raw: None,
            note: Some(e.to_string()),
        },
    }
}

/// E2: join the per-domain summaries with observed case counts.
pub fn domain_breakdown(
    observations: &ObservationSet,
    per_domain: &BTreeMap<String, DomainSummary>,
) -> BTreeMap<String, DomainBreakdown> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for case in observations.cases() {
        *counts.entry(case.domain.as_str()).or_default() += 1;
    }

    per_domain
        .iter()
        .map(|(domain, summary)| {
            (
                domain.clone(),
                DomainBreakdown {
                    n: counts.get(domain.as_str()).copied().unwrap_or(0),
                    llm_exact: summary.llm_exact,
                    ssr_exact: summary.ssr_exact,
                    mean_divergence: summary.mean_divergence,
                },
            )
        })
        .collect()
}

/// E3: signed error descriptives per observed target rating level.
/// Keys are the display form of the level so the artifact stays a plain
/// JSON object.
pub fn errors_by_target_level(observations: &ObservationSet) -> BTreeMap<String, TargetLevelErrors> {
    let mut by_level: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for case in observations.cases() {
        let entry = by_level.entry(format_level(case.target_rating)).or_default();
        entry.0.push(case.llm_rating - case.target_rating);
        entry.1.push(case.ssr_rating - case.target_rating);
    }

    by_level
        .into_iter()
        .map(|(level, (llm, ssr))| {
            (
                level,
                TargetLevelErrors {
                    n: llm.len(),
                    llm_mean_error: mean(&llm),
                    llm_sd_error: population_sd(&llm),
                    ssr_mean_error: mean(&ssr),
                    ssr_sd_error: population_sd(&ssr),
                },
            )
        })
        .collect()
}

/// Integer levels print without a trailing ".0" so artifact keys match
/// the producing pipeline's.
fn format_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{}", level as i64)
    } else {
        format!("{level}")
    }
}

/// E4: SSR confidence descriptives, plus an unadjusted Mann-Whitney
/// against the recovered human-text confidences when available.
pub fn ssr_confidence(
    observations: &ObservationSet,
    ssr_on_human: &RecoveryOutcome,
) -> ConfidenceComparison {
    let generated: Vec<f64> = observations
        .cases()
        .iter()
        .map(|c| c.ssr_confidence)
        .collect();

    let mut comparison = ConfidenceComparison {
        n: generated.len(),
        mean: mean(&generated),
        sd: population_sd(&generated),
        median: median(&generated),
        human_text_n: None,
        human_text_mean: None,
        statistic: None,
        p_raw: None,
        note: None,
    };

    let Some(set) = ssr_on_human.resolved() else {
        comparison.note = Some("no recovered human-text confidences to compare".to_string());
        return comparison;
    };
    if set.confidences.is_empty() {
        comparison.note =
            Some("recovered predictions carry no confidence values".to_string());
        return comparison;
    }

    comparison.human_text_n = Some(set.confidences.len());
    comparison.human_text_mean = Some(mean(&set.confidences));
    match mann_whitney_u(&generated, &set.confidences) {
        Ok(outcome) => {
            comparison.statistic = Some(outcome.statistic);
            comparison.p_raw = Some(outcome.p_value);
        }
        Err(e) => comparison.note = Some(e.to_string()),
    }
    comparison
}

/// Run all four exploratory analyses.
pub fn run_exploratory(
    observations: &ObservationSet,
    per_domain: &BTreeMap<String, DomainSummary>,
    ssr_on_human: &RecoveryOutcome,
) -> ExploratorySection {
    ExploratorySection {
        persona_divergence: persona_divergence(observations),
        domain_breakdown: domain_breakdown(observations, per_domain),
        errors_by_target_level: errors_by_target_level(observations),
        ssr_confidence: ssr_confidence(observations, ssr_on_human),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::CaseRecord;
    use crate::recovery::{resolve_ssr_on_human, AuxSources};

    fn case(llm: f64, ssr: f64, target: f64, persona: &str, domain: &str) -> CaseRecord {
        CaseRecord {
            llm_rating: llm,
            ssr_rating: ssr,
            target_rating: target,
            persona_id: persona.to_string(),
            domain: domain.to_string(),
            ssr_confidence: 0.75,
        }
    }

    #[test]
    fn test_single_persona_skips_omnibus() {
        let obs = ObservationSet::new(vec![
            case(4.0, 3.0, 3.0, "p1", "prose"),
            case(2.0, 2.0, 2.0, "p1", "prose"),
        ]);
        let result = persona_divergence(&obs);
        assert!(result.statistic.is_none());
        assert!(result.note.as_deref().unwrap().contains("fewer than two"));
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups["p1"].n, 2);
    }

    #[test]
    fn test_persona_groups_are_descriptive() {
        let obs = ObservationSet::new(vec![
            case(5.0, 3.0, 3.0, "p1", "prose"),
            case(4.0, 3.0, 3.0, "p1", "prose"),
            case(3.0, 3.0, 3.0, "p2", "prose"),
            case(2.0, 2.0, 2.0, "p2", "prose"),
        ]);
        let result = persona_divergence(&obs);
        assert_eq!(result.groups["p1"].mean_abs_divergence, 1.5);
        assert_eq!(result.groups["p2"].mean_abs_divergence, 0.0);
        assert!(result.p_raw.is_some());
    }

    #[test]
    fn test_domain_breakdown_joins_counts() {
        let obs = ObservationSet::new(vec![
            case(3.0, 3.0, 3.0, "p1", "prose"),
            case(3.0, 3.0, 3.0, "p1", "prose"),
            case(3.0, 3.0, 3.0, "p1", "dialogue"),
        ]);
        let mut per_domain = BTreeMap::new();
        per_domain.insert(
            "prose".to_string(),
            DomainSummary {
                llm_exact: 60.0,
                ssr_exact: 55.0,
                mean_divergence: 0.4,
            },
        );
        per_domain.insert(
            "verse".to_string(),
            DomainSummary {
                llm_exact: 10.0,
                ssr_exact: 20.0,
                mean_divergence: 1.2,
            },
        );
        let breakdown = domain_breakdown(&obs, &per_domain);
        assert_eq!(breakdown["prose"].n, 2);
        assert_eq!(breakdown["verse"].n, 0); // summary domain absent from cases
        assert_eq!(breakdown["prose"].llm_exact, 60.0);
    }

    #[test]
    fn test_errors_by_target_level_keys_and_values() {
        let obs = ObservationSet::new(vec![
            case(4.0, 2.0, 3.0, "p1", "prose"),
            case(2.0, 4.0, 3.0, "p1", "prose"),
            case(5.0, 5.0, 5.0, "p1", "prose"),
        ]);
        let levels = errors_by_target_level(&obs);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels["3"].n, 2);
        assert_eq!(levels["3"].llm_mean_error, 0.0);
        assert_eq!(levels["3"].llm_sd_error, 1.0);
        assert_eq!(levels["5"].ssr_mean_error, 0.0);
    }

    #[test]
    fn test_confidence_without_recovery_is_descriptive_only() {
        let obs = ObservationSet::new(vec![case(3.0, 3.0, 3.0, "p1", "prose")]);
        let outcome = resolve_ssr_on_human(&AuxSources::default());
        let result = ssr_confidence(&obs, &outcome);
        assert_eq!(result.n, 1);
        assert_eq!(result.mean, 0.75);
        assert!(result.p_raw.is_none());
        assert!(result.note.is_some());
    }

    #[test]
    fn test_confidence_comparison_with_recovery() {
        let obs = ObservationSet::new(vec![
            case(3.0, 3.0, 3.0, "p1", "prose"),
            case(3.0, 3.0, 3.0, "p1", "prose"),
        ]);
        let cv = serde_json::json!({"perCase": [
            {"label": "c1", "expected": 3, "predicted": 3, "confidence": 0.9},
            {"label": "c2", "expected": 2, "predicted": 4, "confidence": 0.5}
        ]});
        let sources = AuxSources {
            cross_validation: Some(&cv),
            ablation: None,
        };
        let outcome = resolve_ssr_on_human(&sources);
        let result = ssr_confidence(&obs, &outcome);
        assert_eq!(result.human_text_n, Some(2));
        assert_eq!(result.human_text_mean, Some(0.7));
        assert!(result.p_raw.is_some());
    }
}
