//! Reporting utilities: residuals and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{DeclineModel, FitConfig, FitResult, WellPoint, WellResidual};
use crate::io::ingest::IngestedData;

/// Pair each observed point with its fitted value.
///
/// `fitted` comes from a `FitResult` and is aligned with `points` by
/// construction (same length, same order).
pub fn compute_residuals(points: &[WellPoint], fitted: &[f64]) -> Vec<WellResidual> {
    points
        .iter()
        .zip(fitted)
        .map(|(p, &q_fit)| WellResidual {
            point: *p,
            q_fit,
            residual: p.production - q_fit,
        })
        .collect()
}

/// Human-readable parameter lines for a fitted model.
///
/// Initial rate and the hyperbolic exponent read naturally at two decimals;
/// the decline rate is usually a small number, so it gets scientific notation.
pub fn parameter_readout(model: &DeclineModel) -> Vec<String> {
    let mut lines = vec![
        format!("Initial production rate, q_i: {:.2}", model.qi()),
        format!("Decline rate, d_i: {:.2e}", model.di()),
    ];
    if let Some(b) = model.b() {
        lines.push(format!("Hyperbolic exponent, b: {b:.2}"));
    }
    lines
}

/// Format the full run summary (dataset stats + parameters + fit quality).
pub fn format_run_summary(ingest: &IngestedData, fit: &FitResult, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== dca - Arps Decline Curve Fit ===\n");
    out.push_str(&format!("File: {}\n", config.csv_path.display()));
    out.push_str(&format!("Model: {}\n", fit.model.display_name));
    out.push_str(&format!(
        "Points: n={} | time=[{:.3}, {:.3}] | production=[{:.2}, {:.2}]\n",
        ingest.stats.n_points,
        ingest.stats.time_min,
        ingest.stats.time_max,
        ingest.stats.production_min,
        ingest.stats.production_max
    ));
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!(
            "Rows: read={} used={} skipped={}\n",
            ingest.rows_read,
            ingest.rows_used,
            ingest.row_errors.len()
        ));
    }

    out.push_str("\nFirst points:\n");
    for p in ingest.points.iter().take(5) {
        out.push_str(&format!("  t={:>8.3}  q={:>10.3}\n", p.time, p.production));
    }
    if ingest.points.len() > 5 {
        out.push_str(&format!("  ... and {} more\n", ingest.points.len() - 5));
    }

    out.push_str("\nParameters:\n");
    for line in parameter_readout(&fit.model) {
        out.push_str(&format!("- {line}\n"));
    }

    out.push_str("\nFit quality:\n");
    out.push_str(&format!("- SSE  = {:.4}\n", fit.quality.sse));
    out.push_str(&format!("- RMSE = {:.4}\n", fit.quality.rmse));
    out.push_str(&format!("- Evaluations: {}\n", fit.quality.evaluations));

    out
}

/// Format the worst-residual table (largest |residual| first).
pub fn format_residual_table(residuals: &[WellResidual], max_rows: usize) -> String {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("Largest residuals:\n");
    out.push_str(
        format!(
            "{:>10} {:>12} {:>12} {:>12}\n",
            "time", "production", "fitted", "residual"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:->10} {:->12} {:->12} {:->12}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in sorted.iter().take(max_rows) {
        out.push_str(
            format!(
                "{:>10.3} {:>12.3} {:>12.3} {:>12.3}\n",
                r.point.time, r.point.production, r.q_fit, r.residual
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn residual(time: f64, production: f64, q_fit: f64) -> WellResidual {
        WellResidual {
            point: WellPoint { time, production },
            q_fit,
            residual: production - q_fit,
        }
    }

    #[test]
    fn residuals_align_with_points() {
        let points = vec![
            WellPoint { time: 0.0, production: 100.0 },
            WellPoint { time: 1.0, production: 90.0 },
        ];
        let fitted = vec![99.0, 91.0];

        let residuals = compute_residuals(&points, &fitted);
        assert_eq!(residuals.len(), 2);
        assert!((residuals[0].residual - 1.0).abs() < 1e-12);
        assert!((residuals[1].residual + 1.0).abs() < 1e-12);
        assert_eq!(residuals[1].point.time, 1.0);
    }

    #[test]
    fn readout_formats_di_in_scientific_notation() {
        let model = DeclineModel::new(ModelKind::Exponential, vec![1234.5678, 0.05]);
        let lines = parameter_readout(&model);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Initial production rate, q_i: 1234.57");
        assert_eq!(lines[1], "Decline rate, d_i: 5.00e-2");
    }

    #[test]
    fn readout_includes_b_only_for_hyperbolic() {
        let hyperbolic = DeclineModel::new(ModelKind::Hyperbolic, vec![80.0, 0.1, 0.8]);
        let lines = parameter_readout(&hyperbolic);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Hyperbolic exponent, b: 0.80");

        let harmonic = DeclineModel::new(ModelKind::Harmonic, vec![80.0, 0.1]);
        assert_eq!(parameter_readout(&harmonic).len(), 2);
    }

    #[test]
    fn residual_table_sorts_by_magnitude_and_caps_rows() {
        let residuals = vec![
            residual(0.0, 100.0, 99.0),  // +1
            residual(1.0, 90.0, 95.0),   // -5
            residual(2.0, 80.0, 83.0),   // -3
        ];

        let table = format_residual_table(&residuals, 2);
        let lines: Vec<&str> = table.lines().collect();
        // Title + header + rule + 2 rows.
        assert_eq!(lines.len(), 5);
        assert!(lines[3].contains("-5.000"), "{table}");
        assert!(lines[4].contains("-3.000"), "{table}");
    }
}
