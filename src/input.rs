//! Loading and normalization of the JSON artifacts the pipeline
//! consumes: the primary results file, the optional LLM baseline, and
//! the optional ablation/cross-validation auxiliaries.
//!
//! Independently produced artifacts drift in their field names, so each
//! logical field of a per-case prediction record carries a small
//! ordered list of accepted aliases, resolved once at load time into a
//! canonical [`PredictionRecord`]. Test logic never sees raw JSON.

use crate::observations::{AggregatedCase, BaselineRecord, CaseRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading input artifacts.
///
/// Only the primary results artifact is fatal to the run; callers
/// degrade the optional artifacts to skipped tests instead.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("results artifact {path} contains no cases")]
    EmptyCases { path: String },
}

/// Primary results artifact: per-trial cases plus per-label and
/// per-domain summaries.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsArtifact {
    pub cases: Vec<CaseRecord>,
    pub summary: ResultsSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub aggregated_by_case: Vec<AggregatedCase>,
    /// domain -> externally computed exact-match percentages and mean
    /// divergence. BTreeMap keeps report iteration deterministic.
    pub per_domain: BTreeMap<String, DomainSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    pub llm_exact: f64,
    pub ssr_exact: f64,
    pub mean_divergence: f64,
}

/// Baseline artifact: per-label exact-match flags for the LLM method on
/// human-authored text.
#[derive(Debug, Clone, Deserialize)]
pub struct BaselineArtifact {
    pub results: Vec<BaselineRecord>,
}

/// Ablation artifact: a list of experimental conditions, each with
/// per-case prediction records in whatever field names the producing
/// run used.
#[derive(Debug, Clone, Deserialize)]
pub struct AblationArtifact {
    #[serde(alias = "variants")]
    pub conditions: Vec<AblationCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AblationCondition {
    #[serde(default)]
    pub name: String,

    /// Raw per-case records; producers call this `details`, `perCase`,
    /// or `results`.
    #[serde(default, alias = "perCase", alias = "results")]
    pub details: Vec<Value>,

    /// Canonical records resolved from `details` at load time.
    #[serde(skip)]
    pub predictions: Vec<PredictionRecord>,
}

/// Canonical shape of one per-case prediction after alias resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub label: String,
    pub expected: f64,
    pub predicted: f64,
    pub confidence: Option<f64>,
}

impl PredictionRecord {
    pub fn exact(&self) -> bool {
        self.predicted == self.expected
    }
}

/// Accepted aliases per logical field, in resolution order.
const LABEL_ALIASES: &[&str] = &["label", "testCaseLabel"];
const EXPECTED_ALIASES: &[&str] = &["expected", "targetRating"];
const PREDICTED_ALIASES: &[&str] = &["predicted", "ssrRating"];
const CONFIDENCE_ALIASES: &[&str] = &["confidence"];

fn lookup<'a>(value: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    let obj = value.as_object()?;
    aliases.iter().find_map(|key| obj.get(*key))
}

fn lookup_f64(value: &Value, aliases: &[&str]) -> Option<f64> {
    lookup(value, aliases).and_then(Value::as_f64)
}

/// Resolve one raw per-case record into canonical shape. Records
/// missing a label or either rating are dropped (they cannot join).
pub fn resolve_prediction(value: &Value) -> Option<PredictionRecord> {
    let label = lookup(value, LABEL_ALIASES)?.as_str()?.to_string();
    let expected = lookup_f64(value, EXPECTED_ALIASES)?;
    let predicted = lookup_f64(value, PREDICTED_ALIASES)?;
    let confidence = lookup_f64(value, CONFIDENCE_ALIASES);
    Some(PredictionRecord {
        label,
        expected,
        predicted,
        confidence,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| InputError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load the primary results artifact. Empty case lists are fatal: there
/// is nothing to analyze.
pub fn load_results(path: &Path) -> Result<ResultsArtifact, InputError> {
    let artifact: ResultsArtifact = read_json(path)?;
    if artifact.cases.is_empty() {
        return Err(InputError::EmptyCases {
            path: path.display().to_string(),
        });
    }
    tracing::info!(
        cases = artifact.cases.len(),
        aggregated = artifact.summary.aggregated_by_case.len(),
        "loaded results artifact"
    );
    Ok(artifact)
}

/// Load the optional baseline artifact.
pub fn load_baseline(path: &Path) -> Result<BaselineArtifact, InputError> {
    let artifact: BaselineArtifact = read_json(path)?;
    tracing::info!(labels = artifact.results.len(), "loaded baseline artifact");
    Ok(artifact)
}

/// Load the optional ablation artifact, resolving every condition's raw
/// per-case records into canonical predictions.
pub fn load_ablation(path: &Path) -> Result<AblationArtifact, InputError> {
    let mut artifact: AblationArtifact = read_json(path)?;
    for condition in &mut artifact.conditions {
        condition.predictions = condition
            .details
            .iter()
            .filter_map(resolve_prediction)
            .collect();
        tracing::debug!(
            condition = %condition.name,
            resolved = condition.predictions.len(),
            raw = condition.details.len(),
            "resolved ablation condition"
        );
    }
    Ok(artifact)
}

/// Load an auxiliary artifact with no fixed schema (the
/// cross-validation summary).
pub fn load_value(path: &Path) -> Result<Value, InputError> {
    read_json(path)
}
