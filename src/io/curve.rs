//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted decline curve:
//! - model kind + parameters
//! - run metadata (generation date, source dataset)
//! - a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, DatasetStats, DeclineModel, FitResult};
use crate::error::AppError;
use crate::models::predict;

/// Write a curve JSON file.
pub fn write_curve_json(
    path: &Path,
    fit: &FitResult,
    stats: &DatasetStats,
    source: &str,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    // Always include t=0 in the grid so the curve starts at the initial rate.
    let t0 = stats.time_min.min(0.0);
    let (time, production) = build_grid(&fit.model, t0, stats.time_max, 101).ok_or_else(|| {
        AppError::fit(format!(
            "{} decline is undefined somewhere on the plotting grid.",
            fit.model.display_name
        ))
    })?;

    let curve = CurveFile {
        tool: "dca".to_string(),
        generated: chrono::Local::now().date_naive(),
        source: source.to_string(),
        model: fit.model.clone(),
        fit_quality: fit.quality.clone(),
        grid: CurveGrid { time, production },
    };

    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::usage(format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::usage(format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

fn build_grid(model: &DeclineModel, time_min: f64, time_max: f64, n: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = n.max(2);
    let mut t0 = time_min;
    let mut t1 = time_max;
    if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
        t0 = 0.0;
        t1 = 60.0;
    }
    if (t1 - t0).abs() < 1e-9 {
        t1 = t0 + 1.0;
    }

    let mut time = Vec::with_capacity(n);
    let mut production = Vec::with_capacity(n);

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        time.push(t);
        production.push(predict(model.kind, t, &model.params)?);
    }

    Some((time, production))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    #[test]
    fn grid_starts_at_the_initial_rate() {
        let model = DeclineModel::new(ModelKind::Exponential, vec![100.0, 0.1]);
        let (time, production) = build_grid(&model, 0.0, 24.0, 101).unwrap();
        assert_eq!(time.len(), 101);
        assert_eq!(production.len(), 101);
        assert_eq!(time[0], 0.0);
        assert!((production[0] - 100.0).abs() < 1e-12);
        assert_eq!(time[100], 24.0);
    }

    #[test]
    fn degenerate_span_is_widened() {
        let model = DeclineModel::new(ModelKind::Harmonic, vec![50.0, 0.2]);
        let (time, _) = build_grid(&model, 3.0, 3.0, 11).unwrap();
        assert_eq!(time[0], 3.0);
        assert!((time[10] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_grid_point_yields_none() {
        // base = 1 + b*di*t goes negative well before t = -20.
        let model = DeclineModel::new(ModelKind::Hyperbolic, vec![100.0, 0.1, 1.0]);
        assert!(build_grid(&model, -20.0, 24.0, 101).is_none());
    }
}
