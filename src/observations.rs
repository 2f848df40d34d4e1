//! Data model for one analysis run: per-trial cases, per-label
//! aggregates, baseline records, and the aligned numeric vectors the
//! test battery consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One paired trial. All three ratings share the same bounded ordinal
/// scale, so subtraction between them is meaningful. Every field is
/// required: a case missing a rating is a malformed artifact and fails
/// at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub llm_rating: f64,
    pub ssr_rating: f64,
    pub target_rating: f64,
    pub persona_id: String,
    pub domain: String,
    pub ssr_confidence: f64,
}

/// One record per unique test-case label, collapsing repeated trials of
/// the same underlying item into exact-match flags per method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCase {
    pub test_case_label: String,
    pub llm_exact_match: bool,
    pub ssr_exact_match: bool,
}

/// One record per label from the independent run where the LLM method
/// rated human-authored text directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub label: String,
    pub exact: bool,
}

/// Label-indexed view of baseline records for contingency joins.
pub fn baseline_index(records: &[BaselineRecord]) -> HashMap<&str, bool> {
    records.iter().map(|r| (r.label.as_str(), r.exact)).collect()
}

/// Aligned per-case vectors derived once from the case collection.
///
/// Immutable after construction; every component of the pipeline reads
/// from the same set for the lifetime of one run.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    cases: Vec<CaseRecord>,
    llm_ratings: Vec<f64>,
    ssr_ratings: Vec<f64>,
    target_ratings: Vec<f64>,
    llm_errors: Vec<f64>,
    ssr_errors: Vec<f64>,
    rating_diffs: Vec<f64>,
}

impl ObservationSet {
    pub fn new(cases: Vec<CaseRecord>) -> Self {
        let llm_ratings: Vec<f64> = cases.iter().map(|c| c.llm_rating).collect();
        let ssr_ratings: Vec<f64> = cases.iter().map(|c| c.ssr_rating).collect();
        let target_ratings: Vec<f64> = cases.iter().map(|c| c.target_rating).collect();
        let llm_errors: Vec<f64> = cases
            .iter()
            .map(|c| c.llm_rating - c.target_rating)
            .collect();
        let ssr_errors: Vec<f64> = cases
            .iter()
            .map(|c| c.ssr_rating - c.target_rating)
            .collect();
        let rating_diffs: Vec<f64> = cases
            .iter()
            .map(|c| c.llm_rating - c.ssr_rating)
            .collect();

        Self {
            cases,
            llm_ratings,
            ssr_ratings,
            target_ratings,
            llm_errors,
            ssr_errors,
            rating_diffs,
        }
    }

    pub fn n_cases(&self) -> usize {
        self.cases.len()
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn llm_ratings(&self) -> &[f64] {
        &self.llm_ratings
    }

    pub fn ssr_ratings(&self) -> &[f64] {
        &self.ssr_ratings
    }

    pub fn target_ratings(&self) -> &[f64] {
        &self.target_ratings
    }

    /// Signed error llm_rating - target_rating, per case.
    pub fn llm_errors(&self) -> &[f64] {
        &self.llm_errors
    }

    /// Signed error ssr_rating - target_rating, per case.
    pub fn ssr_errors(&self) -> &[f64] {
        &self.ssr_errors
    }

    /// Rating differential llm_rating - ssr_rating, per case.
    pub fn rating_diffs(&self) -> &[f64] {
        &self.rating_diffs
    }

    /// Paired differences of signed errors (llm_error - ssr_error).
    pub fn error_diffs(&self) -> Vec<f64> {
        self.llm_errors
            .iter()
            .zip(&self.ssr_errors)
            .map(|(l, s)| l - s)
            .collect()
    }
}
