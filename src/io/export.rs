//! Export fitted results and sample datasets to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{WellPoint, WellResidual};
use crate::error::AppError;

/// Write per-point results (observed, fitted, residual) to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[WellResidual]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "time,production,fitted,residual")
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            file,
            "{:.6},{:.4},{:.4},{:.4}",
            r.point.time, r.point.production, r.q_fit, r.residual,
        )
        .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a generated dataset in the same layout `ingest` reads back.
pub fn write_sample_csv(path: &Path, points: &[WellPoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create sample CSV '{}': {e}", path.display())))?;

    writeln!(file, "time,production")
        .map_err(|e| AppError::usage(format!("Failed to write sample CSV header: {e}")))?;

    for p in points {
        writeln!(file, "{:.6},{:.6}", p.time, p.production)
            .map_err(|e| AppError::usage(format!("Failed to write sample CSV row: {e}")))?;
    }

    Ok(())
}
