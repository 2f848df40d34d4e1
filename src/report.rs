//! Report assembly: runs the full pipeline over loaded artifacts and
//! renders the outcome as a persisted JSON artifact and a human-readable
//! text summary.
//!
//! Top-level artifact keys are camelCase; the descriptive block keeps
//! snake_case keys because downstream consumers recompute those values
//! from the raw vectors and join on the key names.

use crate::battery::{
    apply_correction, run_confirmatory_battery, BatteryInputs, CorrectionSummary, TestResult,
};
use crate::config::AnalysisConfig;
use crate::exploratory::{run_exploratory, ExploratorySection};
use crate::input::{AblationArtifact, BaselineArtifact, ResultsArtifact};
use crate::observations::ObservationSet;
use crate::recovery::{resolve_ssr_on_human, AuxSources, RecoveryOutcome};
use crate::stats::{mean, median, population_sd};
use crate::verdict::Scenario;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

/// Where the analyzed artifacts came from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub results: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_validation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ablation: Option<String>,
    /// Label count loaded from the baseline artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_labels: Option<usize>,
    pub tool: String,
    pub version: String,
}

impl Provenance {
    pub fn new(results: &Path) -> Self {
        Self {
            results: results.display().to_string(),
            baseline: None,
            cross_validation: None,
            ablation: None,
            baseline_labels: None,
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Whole-population accuracy descriptives. Standard deviations are
/// population (divide by n) so consumers can reproduce them exactly.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveSummary {
    pub llm_mean_rating: f64,
    pub ssr_mean_rating: f64,
    pub target_mean: f64,
    pub llm_mae: f64,
    pub ssr_mae: f64,
    pub llm_mean_error: f64,
    pub ssr_mean_error: f64,
    pub llm_sd_error: f64,
    pub ssr_sd_error: f64,
    pub llm_exact_pct: f64,
    pub ssr_exact_pct: f64,
    pub llm_within1_pct: f64,
    pub ssr_within1_pct: f64,
    pub mean_rating_diff: f64,
    pub sd_rating_diff: f64,
    pub rating_diff_median: f64,
}

impl DescriptiveSummary {
    fn from_observations(observations: &ObservationSet) -> Self {
        let llm_errors = observations.llm_errors();
        let ssr_errors = observations.ssr_errors();
        let diffs = observations.rating_diffs();
        let abs_mean = |v: &[f64]| mean(&v.iter().map(|x| x.abs()).collect::<Vec<_>>());
        let pct_where = |v: &[f64], pred: fn(&f64) -> bool| {
            if v.is_empty() {
                return 0.0;
            }
            100.0 * v.iter().filter(|x| pred(x)).count() as f64 / v.len() as f64
        };
        let within1 = |v: &[f64]| pct_where(v, |x| x.abs() <= 1.0);
        let exact = |v: &[f64]| pct_where(v, |x| *x == 0.0);

        Self {
            llm_mean_rating: mean(observations.llm_ratings()),
            ssr_mean_rating: mean(observations.ssr_ratings()),
            target_mean: mean(observations.target_ratings()),
            llm_mae: abs_mean(llm_errors),
            ssr_mae: abs_mean(ssr_errors),
            llm_mean_error: mean(llm_errors),
            ssr_mean_error: mean(ssr_errors),
            llm_sd_error: population_sd(llm_errors),
            ssr_sd_error: population_sd(ssr_errors),
            llm_exact_pct: exact(llm_errors),
            ssr_exact_pct: exact(ssr_errors),
            llm_within1_pct: within1(llm_errors),
            ssr_within1_pct: within1(ssr_errors),
            mean_rating_diff: mean(diffs),
            sd_rating_diff: population_sd(diffs),
            rating_diff_median: median(diffs),
        }
    }
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub provenance: Provenance,
    pub n_cases: usize,
    pub n_aggregated: usize,
    pub alpha_level: f64,
    /// Family-wise correction actually applied.
    pub correction: &'static str,
    pub skipped_policy: crate::config::SkippedTestPolicy,
    pub confirmatory_tests: Vec<TestResult>,
    pub n_significant: usize,
    pub n_tested: usize,
    pub scenario: String,
    pub scenario_narrative: &'static str,
    pub descriptive: DescriptiveSummary,
    pub exploratory: ExploratorySection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_strategy: Option<&'static str>,
}

/// Everything one run analyzes; only the results artifact is mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisSources<'a> {
    pub results: Option<&'a ResultsArtifact>,
    pub baseline: Option<&'a BaselineArtifact>,
    pub cross_validation: Option<&'a Value>,
    pub ablation: Option<&'a AblationArtifact>,
}

/// Run the full pipeline: observations, recovery, battery, correction,
/// verdict, descriptives, exploratory.
pub fn analyze(
    sources: &AnalysisSources<'_>,
    config: &AnalysisConfig,
    mut provenance: Provenance,
) -> anyhow::Result<AnalysisReport> {
    let results = sources
        .results
        .ok_or_else(|| anyhow::anyhow!("no results artifact to analyze"))?;
    provenance.baseline_labels = sources.baseline.map(|b| b.results.len());
    let observations = ObservationSet::new(results.cases.clone());
    tracing::info!(cases = observations.n_cases(), "analysis starting");

    let aux = AuxSources {
        cross_validation: sources.cross_validation,
        ablation: sources.ablation,
    };
    let ssr_on_human: RecoveryOutcome = resolve_ssr_on_human(&aux);

    let inputs = BatteryInputs {
        observations: &observations,
        aggregated: &results.summary.aggregated_by_case,
        baseline: sources.baseline.map(|b| b.results.as_slice()),
        ssr_on_human: &ssr_on_human,
    };
    let mut tests = run_confirmatory_battery(&inputs, config);
    let summary: CorrectionSummary = apply_correction(&mut tests, config);

    let scenario = Scenario::classify(summary.n_significant);
    tracing::info!(
        n_significant = summary.n_significant,
        n_tested = summary.n_tested,
        scenario = %scenario,
        "battery complete"
    );

    let exploratory = run_exploratory(
        &observations,
        &results.summary.per_domain,
        &ssr_on_human,
    );

    Ok(AnalysisReport {
        provenance,
        n_cases: observations.n_cases(),
        n_aggregated: results.summary.aggregated_by_case.len(),
        alpha_level: config.alpha,
        correction: if summary.family_corrected {
            "Holm-Bonferroni"
        } else {
            "none (raw p-value thresholds)"
        },
        skipped_policy: config.skipped_policy,
        confirmatory_tests: tests,
        n_significant: summary.n_significant,
        n_tested: summary.n_tested,
        scenario: scenario.label().to_string(),
        scenario_narrative: scenario.narrative(),
        descriptive: DescriptiveSummary::from_observations(&observations),
        exploratory,
        recovery_strategy: ssr_on_human.resolved().map(|s| s.strategy),
    })
}

/// Conventional significance marker for a p-value.
fn significance_marker(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        "ns"
    }
}

impl AnalysisReport {
    /// Render the human-readable text summary printed to stdout.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Rating-method divergence analysis");
        let _ = writeln!(out, "=================================");
        let _ = writeln!(
            out,
            "cases: {}   alpha: {}   correction: {}",
            self.n_cases, self.alpha_level, self.correction
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "Confirmatory battery");
        for (i, test) in self.confirmatory_tests.iter().enumerate() {
            if test.skipped {
                let _ = writeln!(
                    out,
                    "  {}. {} SKIPPED ({})",
                    i + 1,
                    test.name,
                    test.skip_reason.as_deref().unwrap_or("no reason recorded")
                );
                continue;
            }
            let marker = test
                .p_adjusted
                .map(significance_marker)
                .unwrap_or("ns");
            let _ = write!(
                out,
                "  {}. {} stat={:.4} p={:.4}",
                i + 1,
                test.name,
                test.statistic.unwrap_or(f64::NAN),
                test.p_raw
            );
            if let Some(adjusted) = test.p_adjusted {
                let _ = write!(out, " p_adj={adjusted:.4} {marker}");
            }
            if let (Some(name), Some(value)) = (test.effect_name, test.effect_value) {
                let _ = write!(out, " ({name}={value:.3})");
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "rejections: {} of {} tested",
            self.n_significant, self.n_tested
        );
        let _ = writeln!(out, "scenario: {}", self.scenario);
        let _ = writeln!(out, "{}", self.scenario_narrative);
        let _ = writeln!(out);

        let d = &self.descriptive;
        let _ = writeln!(out, "Accuracy against target ratings");
        let _ = writeln!(
            out,
            "  mean ratings: llm={:.3} ssr={:.3} target={:.3}",
            d.llm_mean_rating, d.ssr_mean_rating, d.target_mean
        );
        let _ = writeln!(
            out,
            "  llm: mae={:.3} mean_err={:+.3} sd={:.3} exact={:.1}% within1={:.1}%",
            d.llm_mae, d.llm_mean_error, d.llm_sd_error, d.llm_exact_pct, d.llm_within1_pct
        );
        let _ = writeln!(
            out,
            "  ssr: mae={:.3} mean_err={:+.3} sd={:.3} exact={:.1}% within1={:.1}%",
            d.ssr_mae, d.ssr_mean_error, d.ssr_sd_error, d.ssr_exact_pct, d.ssr_within1_pct
        );

        if let Some(strategy) = self.recovery_strategy {
            let _ = writeln!(out);
            let _ = writeln!(out, "ssr-on-human predictions recovered via: {strategy}");
        }
        out
    }

    /// Persist the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("failed to write report to {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}
