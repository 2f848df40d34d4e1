// Confirmatory test battery: five pre-registered hypothesis tests run
// in a fixed order.
//
// The order is load-bearing. The raw p-values feed positionally into
// the Holm step-down correction, so reordering tests changes which
// adjusted p-value attaches to which hypothesis; treat any reordering
// as a breaking change. The printed and persisted order must match the
// execution order for reproducibility.
//
// A test that cannot run (missing baseline, unrecoverable join data,
// capability disabled) is marked skipped with a reason and, under the
// default policy, contributes a neutral p = 1.0 to the family rather
// than being dropped from it.

use crate::config::{AnalysisConfig, SkippedTestPolicy};
use crate::effect::rank_biserial;
use crate::observations::{baseline_index, AggregatedCase, BaselineRecord, ObservationSet};
use crate::recovery::RecoveryOutcome;
use crate::stats::{
    brown_forsythe, correct_family, mcnemar, mean, population_sd, population_variance,
    signed_rank, ContingencyTable,
};
use serde::Serialize;

/// Statistical family of one confirmatory test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestFamily {
    #[serde(rename = "Wilcoxon signed-rank")]
    WilcoxonSignedRank,
    #[serde(rename = "McNemar")]
    McNemar,
    #[serde(rename = "Brown-Forsythe")]
    BrownForsythe,
}

/// Family-specific auxiliary counts carried in the report.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TestDetail {
    Paired {
        n_nonzero: usize,
        mean_diff: f64,
        sd_diff: f64,
    },
    Contingency {
        contingency: [[u64; 2]; 2],
        b_discordant: u64,
        c_discordant: u64,
        n_matched: u64,
        condition_a_exact: u64,
        condition_b_exact: u64,
    },
    Variance {
        llm_error_var: f64,
        ssr_error_var: f64,
        llm_error_sd: f64,
        ssr_error_sd: f64,
    },
    None {},
}

/// Result of one confirmatory hypothesis test.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub test: TestFamily,
    pub hypothesis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,
    pub p_raw: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_adjusted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_h0: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_value: Option<f64>,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(flatten)]
    pub detail: TestDetail,
}

impl TestResult {
    /// Skipped test: neutral p-value, stated reason, no statistic.
    fn skipped(name: &str, test: TestFamily, hypothesis: &str, reason: String) -> Self {
        tracing::warn!(test = name, reason = %reason, "confirmatory test skipped");
        Self {
            name: name.to_string(),
            test,
            hypothesis: hypothesis.to_string(),
            statistic: None,
            p_raw: 1.0,
            p_adjusted: None,
            reject_h0: None,
            effect_name: None,
            effect_value: None,
            skipped: true,
            skip_reason: Some(reason),
            detail: TestDetail::None {},
        }
    }
}

/// Everything the battery consumes for one run.
#[derive(Debug, Clone, Copy)]
pub struct BatteryInputs<'a> {
    pub observations: &'a ObservationSet,
    pub aggregated: &'a [AggregatedCase],
    pub baseline: Option<&'a [BaselineRecord]>,
    pub ssr_on_human: &'a RecoveryOutcome,
}

/// Run the five confirmatory tests in their pre-registered order.
pub fn run_confirmatory_battery(
    inputs: &BatteryInputs<'_>,
    config: &AnalysisConfig,
) -> Vec<TestResult> {
    vec![
        rating_divergence_test(inputs.observations),
        llm_self_consistency_test(inputs, config),
        ssr_cross_condition_test(inputs, config),
        directional_bias_test(inputs.observations),
        variance_compression_test(inputs.observations),
    ]
}

/// Test 1: paired two-sided test of median(llm - ssr) = 0.
fn rating_divergence_test(observations: &ObservationSet) -> TestResult {
    paired_signed_rank_test(
        "Rating divergence (Wilcoxon signed-rank)",
        "H0: median(llm_rating - ssr_rating) = 0",
        observations.rating_diffs(),
    )
}

/// Test 4: paired two-sided test of median(llm_error - ssr_error) = 0.
fn directional_bias_test(observations: &ObservationSet) -> TestResult {
    paired_signed_rank_test(
        "Directional bias differential (Wilcoxon signed-rank)",
        "H0: median(llm_error - ssr_error) = 0",
        &observations.error_diffs(),
    )
}

fn paired_signed_rank_test(name: &str, hypothesis: &str, diffs: &[f64]) -> TestResult {
    let outcome = signed_rank(diffs);
    TestResult {
        name: name.to_string(),
        test: TestFamily::WilcoxonSignedRank,
        hypothesis: hypothesis.to_string(),
        statistic: Some(outcome.statistic),
        p_raw: outcome.p_value,
        p_adjusted: None,
        reject_h0: None,
        effect_name: Some("rank-biserial r"),
        effect_value: Some(rank_biserial(outcome.statistic, outcome.n_nonzero)),
        skipped: false,
        skip_reason: None,
        detail: TestDetail::Paired {
            n_nonzero: outcome.n_nonzero,
            mean_diff: mean(diffs),
            sd_diff: population_sd(diffs),
        },
    }
}

/// Test 2: marginal homogeneity of LLM exact-match on self-generated
/// vs human-authored text, joined by label against the baseline run.
fn llm_self_consistency_test(inputs: &BatteryInputs<'_>, config: &AnalysisConfig) -> TestResult {
    const NAME: &str = "LLM self-consistency (McNemar)";
    const H0: &str = "H0: LLM accuracy on self-generated text = LLM accuracy on human text";

    if !config.capabilities.contingency_tests {
        return TestResult::skipped(
            NAME,
            TestFamily::McNemar,
            H0,
            "contingency-test support unavailable".to_string(),
        );
    }
    let Some(baseline) = inputs.baseline else {
        return TestResult::skipped(
            NAME,
            TestFamily::McNemar,
            H0,
            "no baseline artifact available".to_string(),
        );
    };

    let index = baseline_index(baseline);
    let pairs = inputs.aggregated.iter().filter_map(|agg| {
        index
            .get(agg.test_case_label.as_str())
            .map(|&on_human| (agg.llm_exact_match, on_human))
    });
    let table = ContingencyTable::from_pairs(pairs);
    if table.n_matched() == 0 {
        return TestResult::skipped(
            NAME,
            TestFamily::McNemar,
            H0,
            "no aggregated labels matched the baseline artifact".to_string(),
        );
    }

    let condition_a_exact = inputs.aggregated.iter().filter(|a| a.llm_exact_match).count() as u64;
    let condition_b_exact = baseline.iter().filter(|r| r.exact).count() as u64;
    contingency_result(NAME, H0, table, condition_a_exact, condition_b_exact)
}

/// Test 3: marginal homogeneity of SSR exact-match on generated vs
/// human-authored text, using the recovered per-label flags.
fn ssr_cross_condition_test(inputs: &BatteryInputs<'_>, config: &AnalysisConfig) -> TestResult {
    const NAME: &str = "SSR cross-condition (McNemar)";
    const H0: &str = "H0: SSR accuracy on generated text = SSR accuracy on human text";

    if !config.capabilities.contingency_tests {
        return TestResult::skipped(
            NAME,
            TestFamily::McNemar,
            H0,
            "contingency-test support unavailable".to_string(),
        );
    }
    let Some(set) = inputs.ssr_on_human.resolved() else {
        let reason = inputs
            .ssr_on_human
            .failure_summary()
            .unwrap_or_else(|| "SSR-on-human predictions unavailable".to_string());
        return TestResult::skipped(NAME, TestFamily::McNemar, H0, reason);
    };

    let pairs = inputs.aggregated.iter().filter_map(|agg| {
        set.exact_by_label
            .get(&agg.test_case_label)
            .map(|&on_human| (agg.ssr_exact_match, on_human))
    });
    let table = ContingencyTable::from_pairs(pairs);
    if table.n_matched() == 0 {
        return TestResult::skipped(
            NAME,
            TestFamily::McNemar,
            H0,
            "no aggregated labels matched the recovered predictions".to_string(),
        );
    }

    let condition_a_exact = inputs.aggregated.iter().filter(|a| a.ssr_exact_match).count() as u64;
    let condition_b_exact = set.exact_by_label.values().filter(|&&e| e).count() as u64;
    contingency_result(NAME, H0, table, condition_a_exact, condition_b_exact)
}

fn contingency_result(
    name: &str,
    hypothesis: &str,
    table: ContingencyTable,
    condition_a_exact: u64,
    condition_b_exact: u64,
) -> TestResult {
    let outcome = mcnemar(&table);
    TestResult {
        name: name.to_string(),
        test: TestFamily::McNemar,
        hypothesis: hypothesis.to_string(),
        statistic: Some(outcome.statistic),
        p_raw: outcome.p_value,
        p_adjusted: None,
        reject_h0: None,
        effect_name: Some("odds ratio"),
        effect_value: Some(table.discordant_odds_ratio()),
        skipped: false,
        skip_reason: None,
        detail: TestDetail::Contingency {
            contingency: table.cells(),
            b_discordant: table.b,
            c_discordant: table.c,
            n_matched: table.n_matched(),
            condition_a_exact,
            condition_b_exact,
        },
    }
}

/// Test 5: equality of error variances, median-centered for robustness.
fn variance_compression_test(observations: &ObservationSet) -> TestResult {
    const NAME: &str = "Variance compression (Brown-Forsythe)";
    const H0: &str = "H0: var(llm_error) = var(ssr_error)";

    let llm_errors = observations.llm_errors();
    let ssr_errors = observations.ssr_errors();
    let outcome = match brown_forsythe(&[llm_errors, ssr_errors]) {
        Ok(outcome) => outcome,
        Err(e) => {
            return TestResult::skipped(NAME, TestFamily::BrownForsythe, H0, e.to_string());
        }
    };

    let llm_var = population_variance(llm_errors);
    let ssr_var = population_variance(ssr_errors);
    let variance_ratio = if ssr_var > 0.0 {
        llm_var / ssr_var
    } else {
        f64::INFINITY
    };

    TestResult {
        name: NAME.to_string(),
        test: TestFamily::BrownForsythe,
        hypothesis: H0.to_string(),
        statistic: Some(outcome.statistic),
        p_raw: outcome.p_value,
        p_adjusted: None,
        reject_h0: None,
        effect_name: Some("variance ratio"),
        effect_value: Some(variance_ratio),
        skipped: false,
        skip_reason: None,
        detail: TestDetail::Variance {
            llm_error_var: llm_var,
            ssr_error_var: ssr_var,
            llm_error_sd: llm_var.sqrt(),
            ssr_error_sd: ssr_var.sqrt(),
        },
    }
}

/// Counts derived from the corrected battery.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CorrectionSummary {
    /// Tests rejecting the null after correction.
    pub n_significant: usize,

    /// Tests that actually ran (non-skipped).
    pub n_tested: usize,

    /// False when the degraded uncorrected fallback was taken.
    pub family_corrected: bool,
}

/// Annotate every test with its adjusted p-value and reject decision,
/// honoring the skipped-test policy.
pub fn apply_correction(results: &mut [TestResult], config: &AnalysisConfig) -> CorrectionSummary {
    let family_corrected = match config.skipped_policy {
        SkippedTestPolicy::NeutralPValue => {
            let p_values: Vec<f64> = results.iter().map(|r| r.p_raw).collect();
            let outcome = correct_family(&p_values, config.alpha, &config.capabilities);
            for (result, (adjusted, reject)) in results
                .iter_mut()
                .zip(outcome.adjusted.iter().zip(&outcome.reject))
            {
                result.p_adjusted = Some(*adjusted);
                result.reject_h0 = Some(*reject);
            }
            outcome.corrected
        }
        SkippedTestPolicy::ExcludeFromFamily => {
            let indices: Vec<usize> = results
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.skipped)
                .map(|(i, _)| i)
                .collect();
            let p_values: Vec<f64> = indices.iter().map(|&i| results[i].p_raw).collect();
            let outcome = correct_family(&p_values, config.alpha, &config.capabilities);
            for (slot, &i) in indices.iter().enumerate() {
                results[i].p_adjusted = Some(outcome.adjusted[slot]);
                results[i].reject_h0 = Some(outcome.reject[slot]);
            }
            outcome.corrected
        }
    };

    let n_significant = results
        .iter()
        .filter(|r| r.reject_h0 == Some(true))
        .count();
    let n_tested = results.iter().filter(|r| !r.skipped).count();
    CorrectionSummary {
        n_significant,
        n_tested,
        family_corrected,
    }
}
