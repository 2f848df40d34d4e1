//! Integration tests for the confirmatory battery and verdict pipeline

use contraste::battery::{apply_correction, run_confirmatory_battery, BatteryInputs};
use contraste::config::AnalysisConfig;
use contraste::input::{load_ablation, AblationArtifact};
use contraste::observations::{AggregatedCase, BaselineRecord, CaseRecord, ObservationSet};
use contraste::recovery::{resolve_ssr_on_human, AuxSources, RecoveryOutcome};
use contraste::stats::{mcnemar, ContingencyTable};
use contraste::verdict::Scenario;

fn case(llm: f64, ssr: f64, target: f64) -> CaseRecord {
    CaseRecord {
        llm_rating: llm,
        ssr_rating: ssr,
        target_rating: target,
        persona_id: "p1".to_string(),
        domain: "prose".to_string(),
        ssr_confidence: 0.8,
    }
}

fn observations_from_diffs(diffs: &[f64]) -> ObservationSet {
    let cases = diffs
        .iter()
        .map(|&d| case(3.0 + d, 3.0, 3.0))
        .collect();
    ObservationSet::new(cases)
}

fn no_recovery() -> RecoveryOutcome {
    resolve_ssr_on_human(&AuxSources::default())
}

#[test]
fn test_five_positive_diffs_yield_no_detectable_bias() {
    // n = 5 all-positive differentials: exact Wilcoxon two-sided
    // p = 2/32 = 0.0625, which cannot survive any five-test family.
    let obs = observations_from_diffs(&[0.50, 0.80, 0.60, 0.40, 0.90]);
    let recovery = no_recovery();
    let inputs = BatteryInputs {
        observations: &obs,
        aggregated: &[],
        baseline: None,
        ssr_on_human: &recovery,
    };
    let config = AnalysisConfig::default();
    let mut results = run_confirmatory_battery(&inputs, &config);
    assert!((results[0].p_raw - 0.0625).abs() < 1e-12);

    let summary = apply_correction(&mut results, &config);
    assert_eq!(summary.n_significant, 0);
    assert_eq!(Scenario::classify(summary.n_significant), Scenario::NoDetectableBias);
}

#[test]
fn test_missing_baseline_degrades_to_skip_not_failure() {
    let obs = observations_from_diffs(&[1.0, -1.0, 0.0, 2.0, 1.0, 0.0, -1.0, 1.0]);
    let recovery = no_recovery();
    let inputs = BatteryInputs {
        observations: &obs,
        aggregated: &[],
        baseline: None,
        ssr_on_human: &recovery,
    };
    let config = AnalysisConfig::default();
    let mut results = run_confirmatory_battery(&inputs, &config);

    assert_eq!(results.len(), 5);
    assert!(results[1].skipped);
    assert_eq!(results[1].p_raw, 1.0);
    assert!(results[1]
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("baseline"));
    assert!(results[2].skipped); // recovery chain also empty

    // The rest of the battery still runs and gets corrected.
    let summary = apply_correction(&mut results, &config);
    assert_eq!(summary.n_tested, 3);
    assert!(results[0].p_adjusted.is_some());
    assert!(results[4].reject_h0.is_some());
}

#[test]
fn test_no_discordance_is_a_clean_null() {
    let table = ContingencyTable::from_pairs([(true, true), (false, false), (true, true)]);
    assert_eq!(table.discordant(), 0);
    let outcome = mcnemar(&table);
    assert_eq!(outcome.p_value, 1.0);
    assert_eq!(table.discordant_odds_ratio(), 1.0);
}

#[test]
fn test_paired_tests_are_symmetric_under_role_swap() {
    let llm = [4.0, 2.0, 5.0, 3.0, 1.0, 4.0, 2.0, 5.0, 3.0, 4.0];
    let ssr = [3.0, 3.0, 4.0, 3.0, 2.0, 5.0, 2.0, 4.0, 2.0, 3.0];
    let target = 3.0;

    let forward = ObservationSet::new(
        llm.iter()
            .zip(&ssr)
            .map(|(&l, &s)| case(l, s, target))
            .collect(),
    );
    let backward = ObservationSet::new(
        llm.iter()
            .zip(&ssr)
            .map(|(&l, &s)| case(s, l, target))
            .collect(),
    );

    let recovery = no_recovery();
    let config = AnalysisConfig::default();
    let run = |obs: &ObservationSet| {
        let inputs = BatteryInputs {
            observations: obs,
            aggregated: &[],
            baseline: None,
            ssr_on_human: &recovery,
        };
        run_confirmatory_battery(&inputs, &config)
    };
    let f = run(&forward);
    let b = run(&backward);

    // Swapping method roles must not change any two-sided p-value.
    for i in [0usize, 3, 4] {
        assert!(
            (f[i].p_raw - b[i].p_raw).abs() < 1e-12,
            "test {i}: {} vs {}",
            f[i].p_raw,
            b[i].p_raw
        );
    }
    // W = min(T+, T-) is swap-symmetric, so the rank-biserial magnitude
    // derived from it is identical in both directions.
    let ef = f[0].effect_value.unwrap();
    let eb = b[0].effect_value.unwrap();
    assert!((ef - eb).abs() < 1e-9);

    // Direction lives in the signed mean differential, which negates.
    let mean_diff = |r: &contraste::battery::TestResult| match &r.detail {
        contraste::battery::TestDetail::Paired { mean_diff, .. } => *mean_diff,
        _ => panic!("expected paired detail"),
    };
    assert!((mean_diff(&f[0]) + mean_diff(&b[0])).abs() < 1e-12);
    assert!((mean_diff(&f[3]) + mean_diff(&b[3])).abs() < 1e-12);
}

#[test]
fn test_identical_methods_are_fully_degenerate() {
    let obs = observations_from_diffs(&[0.0; 12]);
    let recovery = no_recovery();
    let inputs = BatteryInputs {
        observations: &obs,
        aggregated: &[],
        baseline: None,
        ssr_on_human: &recovery,
    };
    let config = AnalysisConfig::default();
    let mut results = run_confirmatory_battery(&inputs, &config);

    assert_eq!(results[0].statistic, Some(0.0));
    assert_eq!(results[0].p_raw, 1.0);
    assert_eq!(results[0].effect_value, Some(0.0));
    assert_eq!(results[3].p_raw, 1.0);

    let summary = apply_correction(&mut results, &config);
    assert_eq!(summary.n_significant, 0);
    assert_eq!(Scenario::classify(0), Scenario::NoDetectableBias);
}

#[test]
fn test_recovered_ablation_enables_cross_condition_test() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ablation.json");
    std::fs::write(
        &path,
        r#"{"conditions": [{"name": "H3-asymmetric", "details": [
            {"label": "c1", "expected": 3, "predicted": 3, "confidence": 0.7},
            {"label": "c2", "expected": 2, "predicted": 4, "confidence": 0.4},
            {"label": "c3", "expected": 5, "predicted": 5, "confidence": 0.9}
        ]}]}"#,
    )
    .unwrap();
    let ablation: AblationArtifact = load_ablation(&path).unwrap();
    let sources = AuxSources {
        cross_validation: None,
        ablation: Some(&ablation),
    };
    let recovery = resolve_ssr_on_human(&sources);

    let aggregated = vec![
        AggregatedCase {
            test_case_label: "c1".into(),
            llm_exact_match: true,
            ssr_exact_match: false,
        },
        AggregatedCase {
            test_case_label: "c2".into(),
            llm_exact_match: false,
            ssr_exact_match: true,
        },
        AggregatedCase {
            test_case_label: "c3".into(),
            llm_exact_match: true,
            ssr_exact_match: true,
        },
    ];
    let obs = observations_from_diffs(&[0.5, -0.5, 1.0]);
    let inputs = BatteryInputs {
        observations: &obs,
        aggregated: &aggregated,
        baseline: None,
        ssr_on_human: &recovery,
    };
    let results = run_confirmatory_battery(&inputs, &AnalysisConfig::default());

    assert!(!results[2].skipped, "recovered predictions should run test 3");
    assert!(results[2].statistic.is_some());
}

#[test]
fn test_baseline_join_ignores_unmatched_labels() {
    let aggregated = vec![
        AggregatedCase {
            test_case_label: "known".into(),
            llm_exact_match: true,
            ssr_exact_match: true,
        },
        AggregatedCase {
            test_case_label: "orphan".into(),
            llm_exact_match: false,
            ssr_exact_match: false,
        },
    ];
    let baseline = vec![BaselineRecord {
        label: "known".into(),
        exact: false,
    }];
    let obs = observations_from_diffs(&[0.5, 1.0]);
    let recovery = no_recovery();
    let inputs = BatteryInputs {
        observations: &obs,
        aggregated: &aggregated,
        baseline: Some(&baseline),
        ssr_on_human: &recovery,
    };
    let results = run_confirmatory_battery(&inputs, &AnalysisConfig::default());
    assert!(!results[1].skipped);
    // Only the one matched label contributes a pair: (true, false) is a
    // single discordant pair, exact binomial p = 1.0.
    assert_eq!(results[1].p_raw, 1.0);
}

#[test]
fn test_verdict_bands() {
    assert_eq!(Scenario::classify(0), Scenario::NoDetectableBias);
    assert_eq!(Scenario::classify(2), Scenario::MixedContextDependent);
    assert_eq!(Scenario::classify(3), Scenario::BiasDetected);
}
