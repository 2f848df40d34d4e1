//! Contraste - Confirmatory divergence analysis between paired rating methods
//!
//! This library runs a pre-registered battery of five hypothesis tests over
//! paired per-case ratings from two generation methods, applies Holm-Bonferroni
//! family-wise correction, classifies the outcome into a scenario verdict, and
//! reports exploratory slices alongside.

pub mod battery;
pub mod cli;
pub mod config;
pub mod effect;
pub mod exploratory;
pub mod input;
pub mod observations;
pub mod recovery;
pub mod report;
pub mod stats;
pub mod verdict;
