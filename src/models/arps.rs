//! Arps decline-curve evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `q(t)` for a parameter vector (for residuals/plots)
//! - fill a Jacobian row `∂q/∂param` at a given `t` (for the solver)
//!
//! Both are domain-checked. Hyperbolic decline is undefined when `b = 0` or
//! when the base `1 + b*di*t` is not strictly positive (fractional power of
//! a non-positive base); harmonic decline has a pole at `1 + di*t = 0`.
//! Evaluation reports those cases as `None`/`false` rather than handing the
//! solver a NaN.

use crate::domain::ModelKind;

/// `q(t) = qi * exp(-di * t)`. Defined for all real inputs.
pub fn exponential_rate(t: f64, qi: f64, di: f64) -> f64 {
    qi * (-di * t).exp()
}

/// `q(t) = qi / (1 + b*di*t)^(1/b)`.
///
/// `None` when `b == 0` or the base `1 + b*di*t` is not strictly positive.
pub fn hyperbolic_rate(t: f64, qi: f64, di: f64, b: f64) -> Option<f64> {
    if b == 0.0 {
        return None;
    }
    let base = 1.0 + b * di * t;
    if base <= 0.0 {
        return None;
    }
    Some(qi * base.powf(-1.0 / b))
}

/// `q(t) = qi / (1 + di*t)`.
///
/// `None` at the pole `1 + di*t == 0`. A negative denominator is a defined
/// (if unphysical) value, unlike the hyperbolic case.
pub fn harmonic_rate(t: f64, qi: f64, di: f64) -> Option<f64> {
    let denom = 1.0 + di * t;
    if denom == 0.0 {
        return None;
    }
    Some(qi / denom)
}

/// Exponential decline over a time series.
pub fn exponential_decline(times: &[f64], qi: f64, di: f64) -> Vec<f64> {
    times.iter().map(|&t| exponential_rate(t, qi, di)).collect()
}

/// Hyperbolic decline over a time series; `None` if any point is undefined.
pub fn hyperbolic_decline(times: &[f64], qi: f64, di: f64, b: f64) -> Option<Vec<f64>> {
    times.iter().map(|&t| hyperbolic_rate(t, qi, di, b)).collect()
}

/// Harmonic decline over a time series; `None` if any point sits on the pole.
pub fn harmonic_decline(times: &[f64], qi: f64, di: f64) -> Option<Vec<f64>> {
    times.iter().map(|&t| harmonic_rate(t, qi, di)).collect()
}

/// Predict `q(t)` for the given model kind.
///
/// `params` is laid out per `ModelKind::param_labels`.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`. Callers size
/// the vector from the same `ModelKind`.
pub fn predict(model: ModelKind, t: f64, params: &[f64]) -> Option<f64> {
    match model {
        ModelKind::Exponential => Some(exponential_rate(t, params[0], params[1])),
        ModelKind::Hyperbolic => hyperbolic_rate(t, params[0], params[1], params[2]),
        ModelKind::Harmonic => harmonic_rate(t, params[0], params[1]),
    }
}

/// Evaluate the model at every time in order; `None` if any evaluation is
/// undefined.
pub fn predict_series(model: ModelKind, times: &[f64], params: &[f64]) -> Option<Vec<f64>> {
    times.iter().map(|&t| predict(model, t, params)).collect()
}

/// Fill `out` with `∂q/∂param` at `t`, in `param_labels` order.
///
/// Returns `false` when the model is undefined at these inputs (same domain
/// conditions as `predict`).
///
/// # Panics
/// Panics if `out` or `params` does not have length `model.param_count()`.
pub fn fill_jacobian_row(model: ModelKind, t: f64, params: &[f64], out: &mut [f64]) -> bool {
    match model {
        ModelKind::Exponential => {
            let (qi, di) = (params[0], params[1]);
            let e = (-di * t).exp();
            out[0] = e;
            out[1] = -qi * t * e;
            true
        }
        ModelKind::Hyperbolic => {
            let (qi, di, b) = (params[0], params[1], params[2]);
            if b == 0.0 {
                return false;
            }
            let base = 1.0 + b * di * t;
            if base <= 0.0 {
                return false;
            }
            let shape = base.powf(-1.0 / b);
            out[0] = shape;
            out[1] = -qi * t * base.powf(-1.0 / b - 1.0);
            out[2] = qi * shape * (base.ln() / (b * b) - (di * t) / (b * base));
            true
        }
        ModelKind::Harmonic => {
            let (qi, di) = (params[0], params[1]);
            let denom = 1.0 + di * t;
            if denom == 0.0 {
                return false;
            }
            out[0] = 1.0 / denom;
            out[1] = -qi * t / (denom * denom);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_known_values() {
        let q = exponential_decline(&[0.0, 1.0, 2.0], 100.0, 0.1);
        assert_eq!(q.len(), 3);
        assert!((q[0] - 100.0).abs() < 1e-12);
        assert!((q[1] - 100.0 * (-0.1f64).exp()).abs() < 1e-12);
        assert!((q[2] - 100.0 * (-0.2f64).exp()).abs() < 1e-12);
        // Two-decimal reference values.
        assert!((q[1] - 90.48).abs() < 5e-3);
        assert!((q[2] - 81.87).abs() < 5e-3);
    }

    #[test]
    fn harmonic_matches_hyperbolic_at_b_one() {
        let qi = 75.5;
        let di = 0.23;
        for i in 0..=40 {
            let t = i as f64 * 0.5;
            let har = harmonic_rate(t, qi, di);
            let hyp = hyperbolic_rate(t, qi, di, 1.0);
            match (har, hyp) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12, "t={t}: {a} vs {b}"),
                other => panic!("expected both defined at t={t}, got {other:?}"),
            }
        }
    }

    #[test]
    fn hyperbolic_approaches_exponential_for_small_b() {
        let qi = 120.0;
        let di = 0.08;
        for i in 1..=10 {
            let t = i as f64;
            let hyp = hyperbolic_rate(t, qi, di, 1e-9).unwrap();
            let exp = exponential_rate(t, qi, di);
            assert!((hyp - exp).abs() / exp < 1e-6, "t={t}: {hyp} vs {exp}");
        }
    }

    #[test]
    fn hyperbolic_domain_guards() {
        // b must be nonzero.
        assert_eq!(hyperbolic_rate(1.0, 100.0, 0.1, 0.0), None);
        // Base exactly zero: 1 + 1*0.1*(-10) = 0.
        assert_eq!(hyperbolic_rate(-10.0, 100.0, 0.1, 1.0), None);
        // Negative base: 1 + 1*0.1*(-20) = -1.
        assert_eq!(hyperbolic_rate(-20.0, 100.0, 0.1, 1.0), None);
        // Jacobian guards agree with evaluation guards.
        let mut row = [0.0; 3];
        assert!(!fill_jacobian_row(
            ModelKind::Hyperbolic,
            -20.0,
            &[100.0, 0.1, 1.0],
            &mut row
        ));
        assert!(fill_jacobian_row(
            ModelKind::Hyperbolic,
            5.0,
            &[100.0, 0.1, 1.0],
            &mut row
        ));
    }

    #[test]
    fn harmonic_pole_guard() {
        // Pole at 1 + 0.1*(-10) = 0.
        assert_eq!(harmonic_rate(-10.0, 50.0, 0.1), None);
        // Past the pole the denominator is negative but defined.
        assert_eq!(harmonic_rate(-20.0, 50.0, 0.1), Some(-50.0));
    }

    #[test]
    fn predict_series_propagates_domain_failure() {
        let params = [100.0, 0.1, 1.0];
        assert!(predict_series(ModelKind::Hyperbolic, &[0.0, 5.0, -20.0], &params).is_none());
        let ok = predict_series(ModelKind::Hyperbolic, &[0.0, 5.0, 10.0], &params);
        assert_eq!(ok.map(|v| v.len()), Some(3));
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let cases: [(ModelKind, Vec<f64>); 3] = [
            (ModelKind::Exponential, vec![80.0, 0.12]),
            (ModelKind::Hyperbolic, vec![80.0, 0.12, 0.6]),
            (ModelKind::Harmonic, vec![80.0, 0.12]),
        ];
        for (kind, params) in cases {
            for &t in &[0.5, 3.0, 17.0] {
                let k = kind.param_count();
                let mut row = vec![0.0; k];
                assert!(fill_jacobian_row(kind, t, &params, &mut row));
                for j in 0..k {
                    let h = 1e-6 * params[j].abs().max(1e-3);
                    let mut up = params.clone();
                    let mut dn = params.clone();
                    up[j] += h;
                    dn[j] -= h;
                    let fd = (predict(kind, t, &up).unwrap() - predict(kind, t, &dn).unwrap())
                        / (2.0 * h);
                    let scale = fd.abs().max(row[j].abs()).max(1e-8);
                    assert!(
                        (fd - row[j]).abs() / scale < 1e-5,
                        "{kind:?} param {j} at t={t}: analytic {} vs fd {fd}",
                        row[j]
                    );
                }
            }
        }
    }
}
