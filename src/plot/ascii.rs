//! Monochrome ASCII overlay plot.
//!
//! A fixed-size character raster, deterministic by construction so golden
//! tests can pin the output. Observed points render as `o` over a `-` line
//! for the fitted curve, with a one-line header naming the axis ranges.

use crate::domain::{CurveFile, DeclineModel, FitResult, WellResidual};
use crate::models::predict;

/// Render the observed/fitted overlay for an in-memory fit result.
pub fn render_ascii_plot(residuals: &[WellResidual], fit: &FitResult, width: usize, height: usize) -> String {
    let (t_min, t_max) =
        span(residuals.iter().map(|r| r.point.time)).unwrap_or((0.0, 60.0));
    let curve = sample_curve(&fit.model, t_min, t_max, width.max(2));
    render(residuals, &curve, t_min, t_max, width, height)
}

/// Render a saved curve file (its precomputed grid, no overlay points).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let (t_min, t_max) = span(curve.grid.time.iter().copied()).unwrap_or((0.0, 60.0));
    let series: Vec<(f64, f64)> = curve
        .grid
        .time
        .iter()
        .copied()
        .zip(curve.grid.production.iter().copied())
        .collect();
    render(&[], &series, t_min, t_max, width, height)
}

/// Evaluate the model along the plot range, dropping undefined samples.
fn sample_curve(model: &DeclineModel, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .filter_map(|i| {
            let t = t_min + (t_max - t_min) * i as f64 / (n as f64 - 1.0);
            predict(model.kind, t, &model.params).map(|q| (t, q))
        })
        .collect()
}

fn render(
    residuals: &[WellResidual],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let q_span = span(
        residuals
            .iter()
            .map(|r| r.point.production)
            .chain(curve.iter().map(|&(_, q)| q)),
    )
    .unwrap_or((0.0, 1.0));
    // 5% headroom so extreme points don't sit on the frame edge.
    let (q_min, q_max) = pad(q_span, 0.05);

    let mut canvas = Canvas::blank(width, height);
    let scale = Scale {
        t_min,
        t_max,
        q_min,
        q_max,
    };

    // Curve first; observation markers overwrite it where they coincide.
    let mut prev: Option<(usize, usize)> = None;
    for &(t, q) in curve {
        let cell = scale.cell(t, q, width, height);
        match prev {
            Some(from) => canvas.line(from, cell, '-'),
            None => canvas.put(cell, '-'),
        }
        prev = Some(cell);
    }
    for r in residuals {
        canvas.put(scale.cell(r.point.time, r.point.production, width, height), 'o');
    }

    let mut out = format!(
        "Plot: time=[{t_min:.3}, {t_max:.3}] | production=[{q_min:.2}, {q_max:.2}]\n"
    );
    out.push_str(&canvas.into_string());
    out
}

/// Min/max of a sequence; `None` unless the result is finite and non-empty
/// with a positive extent.
fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (lo.is_finite() && hi.is_finite() && hi > lo).then_some((lo, hi))
}

fn pad((lo, hi): (f64, f64), frac: f64) -> (f64, f64) {
    let margin = ((hi - lo).abs() * frac).max(1e-12);
    (lo - margin, hi + margin)
}

/// Data-to-cell mapping. Row 0 is the top of the raster (largest q).
struct Scale {
    t_min: f64,
    t_max: f64,
    q_min: f64,
    q_max: f64,
}

impl Scale {
    fn cell(&self, t: f64, q: f64, width: usize, height: usize) -> (usize, usize) {
        let u = ((t - self.t_min) / (self.t_max - self.t_min)).clamp(0.0, 1.0);
        let v = ((q - self.q_min) / (self.q_max - self.q_min)).clamp(0.0, 1.0);
        let col = (u * (width as f64 - 1.0)).round() as usize;
        let row = ((1.0 - v) * (height as f64 - 1.0)).round() as usize;
        (col, row)
    }
}

/// A flat character raster.
struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Canvas {
    fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    fn put(&mut self, (col, row): (usize, usize), ch: char) {
        if col < self.width && row < self.height {
            self.cells[row * self.width + col] = ch;
        }
    }

    fn put_if_blank(&mut self, cell: (usize, usize), ch: char) {
        let (col, row) = cell;
        if col < self.width && row < self.height && self.cells[row * self.width + col] == ' ' {
            self.cells[row * self.width + col] = ch;
        }
    }

    /// Connect two cells by stepping along the longer axis.
    fn line(&mut self, (c0, r0): (usize, usize), (c1, r1): (usize, usize), ch: char) {
        let dc = c1 as f64 - c0 as f64;
        let dr = r1 as f64 - r0 as f64;
        let steps = dc.abs().max(dr.abs()) as usize;
        if steps == 0 {
            self.put_if_blank((c0, r0), ch);
            return;
        }
        for s in 0..=steps {
            let f = s as f64 / steps as f64;
            let col = (c0 as f64 + f * dc).round() as usize;
            let row = (r0 as f64 + f * dr).round() as usize;
            self.put_if_blank((col, row), ch);
        }
    }

    fn into_string(self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveGrid, FitQuality, ModelKind, WellPoint};

    fn residual(time: f64, production: f64) -> WellResidual {
        WellResidual {
            point: WellPoint { time, production },
            q_fit: production,
            residual: 0.0,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        // Zero decline keeps the fitted curve flat at q_i, which makes the
        // raster easy to check by hand.
        let residuals = vec![residual(1.0, 100.0), residual(10.0, 110.0)];
        let fit = FitResult {
            model: DeclineModel::new(ModelKind::Exponential, vec![100.0, 0.0]),
            quality: FitQuality { sse: 0.0, rmse: 0.0, n: 2, evaluations: 1 },
            fitted: vec![100.0, 100.0],
        };

        let txt = render_ascii_plot(&residuals, &fit, 10, 5);
        let expected = concat!(
            "Plot: time=[1.000, 10.000] | production=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn curve_file_renders_without_overlay_points() {
        let curve = CurveFile {
            tool: "dca".to_string(),
            generated: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            source: "well.csv".to_string(),
            model: DeclineModel::new(ModelKind::Harmonic, vec![100.0, 0.1]),
            fit_quality: FitQuality { sse: 0.0, rmse: 0.0, n: 0, evaluations: 1 },
            grid: CurveGrid {
                time: vec![0.0, 12.0, 24.0],
                production: vec![100.0, 45.5, 29.4],
            },
        };

        let txt = render_ascii_plot_from_curve_file(&curve, 20, 8);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("Plot: time=[0.000, 24.000]"));
        assert!(txt.contains('-'));
        assert!(!txt.contains('o'));
    }

    #[test]
    fn undefined_curve_samples_are_skipped() {
        // The hyperbolic base goes negative left of t = -10; those samples
        // are dropped instead of poisoning the raster.
        let residuals = vec![residual(-40.0, 50.0), residual(3.0, 85.0)];
        let fit = FitResult {
            model: DeclineModel::new(ModelKind::Hyperbolic, vec![100.0, 0.1, 1.0]),
            quality: FitQuality { sse: 0.0, rmse: 0.0, n: 2, evaluations: 1 },
            fitted: vec![50.0, 85.0],
        };

        let txt = render_ascii_plot(&residuals, &fit, 30, 10);
        assert_eq!(txt.lines().count(), 11);
        assert!(txt.contains('o'));
    }

    #[test]
    fn degenerate_ranges_fall_back_to_defaults() {
        assert_eq!(span([5.0, 5.0].into_iter()), None);
        assert_eq!(span(std::iter::empty::<f64>()), None);
        assert_eq!(span([1.0, 4.0].into_iter()), Some((1.0, 4.0)));
    }
}
