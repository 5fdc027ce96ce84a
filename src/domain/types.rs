//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Arps decline-model family.
///
/// A closed set: adding or removing a variant is a compile-time change that
/// every dispatch site (evaluation, Jacobians, readouts) must acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `q(t) = qi * exp(-di * t)`
    Exponential,
    /// `q(t) = qi / (1 + b*di*t)^(1/b)`
    Hyperbolic,
    /// `q(t) = qi / (1 + di*t)` — hyperbolic at `b = 1`, with 2 free
    /// parameters instead of 3.
    Harmonic,
}

impl ModelKind {
    /// Every variant, in readout order.
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Exponential,
        ModelKind::Hyperbolic,
        ModelKind::Harmonic,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "Exponential",
            ModelKind::Hyperbolic => "Hyperbolic",
            ModelKind::Harmonic => "Harmonic",
        }
    }

    /// Number of free parameters fitted for this variant.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Exponential => 2,
            ModelKind::Hyperbolic => 3,
            ModelKind::Harmonic => 2,
        }
    }

    /// Parameter names in vector order.
    pub fn param_labels(self) -> &'static [&'static str] {
        match self {
            ModelKind::Exponential => &["qi", "di"],
            ModelKind::Hyperbolic => &["qi", "di", "b"],
            ModelKind::Harmonic => &["qi", "di"],
        }
    }
}

/// One observed (time, production-rate) pair.
///
/// Time units are whatever the input uses (days, months); the fit is
/// unit-agnostic as long as `di` is read in the reciprocal unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellPoint {
    pub time: f64,
    pub production: f64,
}

/// A per-point fitted result (used for residual tables and exports).
#[derive(Debug, Clone)]
pub struct WellResidual {
    pub point: WellPoint,
    pub q_fit: f64,
    /// `production - q_fit`; positive means the well outperformed the curve.
    pub residual: f64,
}

/// Summary statistics of an ingested dataset.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub time_min: f64,
    pub time_max: f64,
    pub production_min: f64,
    pub production_max: f64,
}

impl DatasetStats {
    /// `None` when `points` is empty or contains nothing finite to bound.
    pub fn from_points(points: &[WellPoint]) -> Option<Self> {
        let mut time_min = f64::INFINITY;
        let mut time_max = f64::NEG_INFINITY;
        let mut production_min = f64::INFINITY;
        let mut production_max = f64::NEG_INFINITY;

        for p in points {
            time_min = time_min.min(p.time);
            time_max = time_max.max(p.time);
            production_min = production_min.min(p.production);
            production_max = production_max.max(p.production);
        }

        if !(time_min.is_finite()
            && time_max.is_finite()
            && production_min.is_finite()
            && production_max.is_finite())
        {
            return None;
        }

        Some(Self {
            n_points: points.len(),
            time_min,
            time_max,
            production_min,
            production_max,
        })
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    /// Residual-vector evaluations spent by the solver.
    pub evaluations: usize,
}

/// Fitted model parameters and metadata.
///
/// `params` is laid out per `ModelKind::param_labels`: `[qi, di]` for
/// exponential/harmonic, `[qi, di, b]` for hyperbolic. Constructed only by
/// the fitter, always with `kind.param_count()` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineModel {
    pub kind: ModelKind,
    pub display_name: String,
    pub params: Vec<f64>,
}

impl DeclineModel {
    pub fn new(kind: ModelKind, params: Vec<f64>) -> Self {
        Self {
            kind,
            display_name: kind.display_name().to_string(),
            params,
        }
    }

    /// Initial production rate.
    pub fn qi(&self) -> f64 {
        self.params[0]
    }

    /// Initial decline rate.
    pub fn di(&self) -> f64 {
        self.params[1]
    }

    /// Hyperbolic exponent, present only for `ModelKind::Hyperbolic`.
    pub fn b(&self) -> Option<f64> {
        match self.kind {
            ModelKind::Hyperbolic => self.params.get(2).copied(),
            ModelKind::Exponential | ModelKind::Harmonic => None,
        }
    }
}

/// Successful fit output for one model/dataset pair.
///
/// Immutable once built; a failed fit never produces one of these — failures
/// travel as `AppError` so a partial result can't be mistaken for a fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: DeclineModel,
    pub quality: FitQuality,
    /// Model evaluated at each input time, same length and order as the
    /// observed series.
    pub fitted: Vec<f64>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub model: ModelKind,

    /// Solver budget: residual evaluations before the fit is declared
    /// non-convergent.
    pub max_evaluations: usize,

    /// Rows of the residual table to print (largest |residual| first).
    pub residual_rows: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated: NaiveDate,
    pub source: String,
    pub model: DeclineModel,
    pub fit_quality: FitQuality,
    pub grid: CurveGrid,
}

/// A dense evaluation of the fitted curve for re-plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub time: Vec<f64>,
    pub production: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_counts_match_labels() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.param_count(), kind.param_labels().len());
        }
    }

    #[test]
    fn hyperbolic_exposes_b_others_do_not() {
        let hyp = DeclineModel::new(ModelKind::Hyperbolic, vec![100.0, 0.1, 0.5]);
        assert_eq!(hyp.b(), Some(0.5));
        assert_eq!(hyp.qi(), 100.0);
        assert_eq!(hyp.di(), 0.1);

        let exp = DeclineModel::new(ModelKind::Exponential, vec![100.0, 0.1]);
        assert_eq!(exp.b(), None);

        let har = DeclineModel::new(ModelKind::Harmonic, vec![100.0, 0.1]);
        assert_eq!(har.b(), None);
    }
}
