//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the decline-model enum (`ModelKind`) and fitted-model types
//!   (`DeclineModel`, `FitQuality`, `FitResult`)
//! - normalized well observations (`WellPoint`) and derived residuals
//! - run configuration (`FitConfig`) and the saved-curve file format

pub mod types;

pub use types::*;
