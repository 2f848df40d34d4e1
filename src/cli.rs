//! CLI argument parsing for Contraste

use crate::config::{AnalysisConfig, SkippedTestPolicy};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contraste")]
#[command(version)]
#[command(
    about = "Confirmatory divergence analysis between paired rating methods",
    long_about = None
)]
pub struct Cli {
    /// Primary results artifact (per-case ratings plus summaries)
    #[arg(value_name = "RESULTS")]
    pub results: PathBuf,

    /// Baseline artifact: LLM exact-match flags on human-authored text
    #[arg(short = 'b', long = "baseline", value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Ablation artifact with per-condition prediction records
    #[arg(short = 'a', long = "ablation", value_name = "FILE")]
    pub ablation: Option<PathBuf>,

    /// Cross-validation summary artifact
    #[arg(long = "cross-validation", value_name = "FILE")]
    pub cross_validation: Option<PathBuf>,

    /// Family-wise significance level for the confirmatory battery
    #[arg(long = "alpha", value_name = "ALPHA", default_value = "0.05")]
    pub alpha: f64,

    /// How skipped tests participate in the correction family
    #[arg(
        long = "skipped-policy",
        value_enum,
        default_value = "neutral-p-value"
    )]
    pub skipped_policy: SkippedTestPolicy,

    /// Where to write the JSON report (default: <RESULTS stem>-stats.json
    /// next to the results artifact)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the text summary only; skip writing the JSON report
    #[arg(long = "no-artifact")]
    pub no_artifact: bool,

    /// Enable debug logging to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Analysis configuration implied by the flags.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            alpha: self.alpha,
            skipped_policy: self.skipped_policy,
            ..AnalysisConfig::default()
        }
    }

    /// Report path: explicit -o wins, otherwise derived from the results
    /// artifact's file stem.
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let stem = self
            .results
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".to_string());
        self.results.with_file_name(format!("{stem}-stats.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::parse_from(["contraste", "run7/results.json"]);
        assert_eq!(cli.results, PathBuf::from("run7/results.json"));
        assert!(cli.baseline.is_none());
        assert_eq!(cli.alpha, 0.05);
        assert_eq!(cli.skipped_policy, SkippedTestPolicy::NeutralPValue);
    }

    #[test]
    fn test_default_output_derives_from_stem() {
        let cli = Cli::parse_from(["contraste", "run7/results.json"]);
        assert_eq!(cli.output_path(), PathBuf::from("run7/results-stats.json"));
    }

    #[test]
    fn test_explicit_output_wins() {
        let cli = Cli::parse_from(["contraste", "results.json", "-o", "/tmp/out.json"]);
        assert_eq!(cli.output_path(), PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn test_policy_and_alpha_flags() {
        let cli = Cli::parse_from([
            "contraste",
            "results.json",
            "--alpha",
            "0.01",
            "--skipped-policy",
            "exclude-from-family",
        ]);
        let config = cli.analysis_config();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.skipped_policy, SkippedTestPolicy::ExcludeFromFamily);
    }
}
