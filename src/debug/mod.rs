//! Debug bundle writer for inspecting a dataset and all decline-model fits.
//!
//! The bundle is a timestamped markdown file under `debug/` holding the raw
//! points, any skipped rows, and a fit attempt for every model variant. It is
//! diagnostics only: nothing here feeds back into which model gets reported.

use std::fs::{File, create_dir_all};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Local;

use crate::domain::{FitConfig, FitResult, ModelKind};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_model};
use crate::io::ingest::IngestedData;
use crate::models::predict;

pub fn write_debug_bundle(ingest: &IngestedData, config: &FitConfig) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let stem = config
        .csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("well");
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("dca_debug_{stem}_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    write_bundle(&mut file, ingest, config)
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn write_bundle(file: &mut File, ingest: &IngestedData, config: &FitConfig) -> io::Result<()> {
    writeln!(file, "# dca debug bundle")?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(file, "- source: {}", config.csv_path.display())?;
    writeln!(
        file,
        "- rows: read={} used={} skipped={}",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    )?;
    writeln!(
        file,
        "- points: n={} | time=[{:.3}, {:.3}] | production=[{:.3}, {:.3}]",
        ingest.stats.n_points,
        ingest.stats.time_min,
        ingest.stats.time_max,
        ingest.stats.production_min,
        ingest.stats.production_max
    )?;
    writeln!(file, "- selected model: {}", config.model.display_name())?;
    writeln!(file, "- max evaluations: {}", config.max_evaluations)?;

    if !ingest.row_errors.is_empty() {
        writeln!(file, "\n## Skipped rows")?;
        writeln!(file, "| line | error |")?;
        writeln!(file, "| - | - |")?;
        for err in &ingest.row_errors {
            writeln!(file, "| {} | {} |", err.line, err.message)?;
        }
    }

    writeln!(file, "\n## Points")?;
    writeln!(file, "| time | production |")?;
    writeln!(file, "| - | - |")?;
    for p in &ingest.points {
        writeln!(file, "| {:.6} | {:.6} |", p.time, p.production)?;
    }

    // Fit every variant with the current budget. These are diagnostics for
    // eyeballing how the families disagree on this dataset, not a selection.
    let options = FitOptions {
        max_evaluations: config.max_evaluations,
    };
    let attempts: Vec<(ModelKind, Result<FitResult, AppError>)> = ModelKind::ALL
        .iter()
        .map(|&kind| (kind, fit_model(kind, &ingest.points, &options)))
        .collect();

    writeln!(file, "\n## Fit attempts")?;
    writeln!(file, "| model | qi | di | b | sse | rmse | evals |")?;
    writeln!(file, "| - | - | - | - | - | - | - |")?;
    for (kind, attempt) in &attempts {
        match attempt {
            Ok(fit) => writeln!(
                file,
                "| {} | {:.6} | {:.6e} | {} | {:.6} | {:.6} | {} |",
                kind.display_name(),
                fit.model.qi(),
                fit.model.di(),
                fit.model.b().map(|b| format!("{b:.6}")).unwrap_or_else(|| "-".to_string()),
                fit.quality.sse,
                fit.quality.rmse,
                fit.quality.evaluations
            )?,
            Err(err) => writeln!(file, "| {} | failed: {} |", kind.display_name(), err)?,
        }
    }

    writeln!(file, "\n## Curve grid")?;
    writeln!(file, "| time | Exponential | Hyperbolic | Harmonic |")?;
    writeln!(file, "| - | - | - | - |")?;

    let t0 = ingest.stats.time_min.min(0.0);
    let t1 = ingest.stats.time_max.max(t0 + 1.0);
    let rows = 25usize;
    for i in 0..rows {
        let u = i as f64 / (rows as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        write!(file, "| {t:.2} |")?;
        for (_, attempt) in &attempts {
            let value = attempt
                .as_ref()
                .ok()
                .and_then(|fit| predict(fit.model.kind, t, &fit.model.params));
            write!(file, " {} |", fmt_opt(value))?;
        }
        writeln!(file)?;
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}
