//! Initial parameter seeding.
//!
//! The solver is only as reliable as its starting point, and observed qi
//! magnitudes range from single digits to tens of thousands depending on the
//! well and the units. Seeds:
//!
//! - `qi`: the maximum observed production (a decline series starts near its
//!   peak rate)
//! - `di`: the log-ratio of earliest-to-latest production over the time span
//!   when the series actually declines — exact for exponential data and a
//!   usable scale for the others — otherwise a small positive fallback
//! - `b`: 1.0 for hyperbolic, the top of the usual 0 < b ≤ 1 range

use crate::domain::{ModelKind, WellPoint};

/// Initial decline rate when the data offers no usable log-slope.
pub const DI_FALLBACK: f64 = 0.05;

/// Build the starting parameter vector for `kind`.
///
/// Always returns `kind.param_count()` entries in `param_labels` order.
/// Assumes the caller has already rejected non-finite points.
pub fn initial_params(kind: ModelKind, points: &[WellPoint]) -> Vec<f64> {
    let qi = seed_qi(points);
    let di = seed_di(points);
    match kind {
        ModelKind::Exponential | ModelKind::Harmonic => vec![qi, di],
        ModelKind::Hyperbolic => vec![qi, di, 1.0],
    }
}

fn seed_qi(points: &[WellPoint]) -> f64 {
    let max = points
        .iter()
        .map(|p| p.production)
        .fold(f64::NAN, f64::max);
    // Zero would kill the di column of the Jacobian at the start.
    if max.is_finite() && max != 0.0 { max } else { 1.0 }
}

fn seed_di(points: &[WellPoint]) -> f64 {
    let earliest = points.iter().min_by(|a, b| a.time.total_cmp(&b.time));
    let latest = points.iter().max_by(|a, b| a.time.total_cmp(&b.time));
    let (Some(first), Some(last)) = (earliest, latest) else {
        return DI_FALLBACK;
    };

    let span = last.time - first.time;
    if span > 0.0
        && first.production > 0.0
        && last.production > 0.0
        && first.production > last.production
    {
        let di = (first.production / last.production).ln() / span;
        if di.is_finite() { di } else { DI_FALLBACK }
    } else {
        DI_FALLBACK
    }
}
