//! Shared "fit pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> fit -> residuals
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::domain::{FitConfig, FitResult, WellResidual};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_model};
use crate::io::ingest::{IngestedData, load_well_points};

/// All computed outputs of a single `dca fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub fit: FitResult,
    pub residuals: Vec<WellResidual>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_well_points(&config.csv_path)?;
    run_fit_with_ingest(config, ingest)
}

/// Execute the fitting pipeline on already-loaded data.
///
/// This is useful for the TUI where we want to refit (model or budget change)
/// without re-reading the CSV.
pub fn run_fit_with_ingest(config: &FitConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let options = FitOptions {
        max_evaluations: config.max_evaluations,
    };
    let fit = fit_model(config.model, &ingest.points, &options)?;
    let residuals = crate::report::compute_residuals(&ingest.points, &fit.fitted);

    Ok(RunOutput {
        ingest,
        fit,
        residuals,
    })
}
