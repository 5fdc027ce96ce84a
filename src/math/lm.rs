//! Levenberg–Marquardt nonlinear least squares.
//!
//! The decline models are nonlinear in every parameter, so each fit solves:
//!
//! ```text
//! minimize  S(p) = Σ (y_i - model(t_i, p))^2
//! ```
//!
//! by the classic damped Gauss–Newton iteration: at the current `p`, solve
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀ r
//! ```
//!
//! where `J = ∂model/∂p` and `r = y - model(t, p)`, then accept `p + δ`
//! if it lowers `S`, shrinking `λ` on success and inflating it on rejection.
//!
//! Implementation choices:
//! - The driver is generic over residual/Jacobian closures; model evaluation
//!   can fail (domain violations), reported as `None`. A failed *trial* step
//!   is treated as non-improving; a failure at the current point aborts.
//! - Damped systems are solved by Cholesky first, falling back to SVD with
//!   progressively looser tolerances for near-singular cases. The parameter
//!   dimension here is tiny (2–3), so cost is irrelevant.
//! - Work is bounded by a residual-evaluation budget rather than wall time.

use nalgebra::{DMatrix, DVector};

/// Largest damping factor tried before declaring the system unsolvable.
const LAMBDA_MAX: f64 = 1e16;
/// Damping floor; keeps `λ` from underflowing to a useless zero.
const LAMBDA_MIN: f64 = 1e-12;

/// Solver policy knobs.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Residual-vector evaluations allowed before giving up.
    pub max_evaluations: usize,
    /// Relative SSE improvement below which an accepted step means convergence.
    pub ftol: f64,
    /// Step-size tolerance relative to the parameter norm.
    pub xtol: f64,
    /// Gradient infinity-norm below which the current point is accepted.
    pub gtol: f64,
    /// Initial damping factor.
    pub lambda_init: f64,
    /// Multiplier applied to `λ` when a step is rejected.
    pub lambda_up: f64,
    /// Multiplier applied to `λ` when a step is accepted.
    pub lambda_down: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            // The MINPACK defaults used by common LM frontends.
            ftol: 1.49e-8,
            xtol: 1.49e-8,
            gtol: 1e-12,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

/// Why a solve failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LmError {
    /// The model is undefined (or non-finite) at the current parameters.
    Domain,
    /// The evaluation budget ran out before meeting any tolerance.
    Budget { evaluations: usize },
    /// The damped normal equations stayed unsolvable at maximum damping.
    Singular,
}

/// A converged solve.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: DVector<f64>,
    pub sse: f64,
    pub evaluations: usize,
    pub iterations: usize,
}

/// Solve `(JᵀJ + λ·diag(JᵀJ)) δ = g`.
///
/// Returns `None` if the damped system is too ill-conditioned to solve
/// robustly.
pub fn solve_damped(jtj: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let k = jtj.nrows();
    let mut damped = jtj.clone();
    for i in 0..k {
        // The floor keeps zero-curvature directions damped too.
        damped[(i, i)] += lambda * jtj[(i, i)].abs().max(1e-12);
    }

    if let Some(chol) = damped.clone().cholesky() {
        let delta = chol.solve(g);
        if delta.iter().all(|v| v.is_finite()) {
            return Some(delta);
        }
    }

    // Try progressively looser tolerances if the strict solve fails.
    let svd = damped.svd(true, true);
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(delta) = svd.solve(g, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }

    None
}

/// Run the damped iteration from `start`.
///
/// `residuals` returns `y - model(t, p)` for the full dataset, or `None`
/// where the model is undefined. `jacobian` returns the `n × k` matrix of
/// model partials `∂model/∂p_j` at each data point, or `None` likewise.
pub fn levenberg_marquardt<R, J>(
    start: DVector<f64>,
    cfg: &LmConfig,
    mut residuals: R,
    mut jacobian: J,
) -> Result<LmOutcome, LmError>
where
    R: FnMut(&DVector<f64>) -> Option<DVector<f64>>,
    J: FnMut(&DVector<f64>) -> Option<DMatrix<f64>>,
{
    let mut params = start;
    let mut evaluations = 1usize;
    let mut residual = residuals(&params).ok_or(LmError::Domain)?;
    let mut sse = residual.norm_squared();
    if !sse.is_finite() {
        return Err(LmError::Domain);
    }

    let mut lambda = cfg.lambda_init;
    let mut iterations = 0usize;

    loop {
        iterations += 1;

        let jac = jacobian(&params).ok_or(LmError::Domain)?;
        let gradient = jac.transpose() * &residual;
        if gradient.amax() <= cfg.gtol {
            return Ok(LmOutcome {
                params,
                sse,
                evaluations,
                iterations,
            });
        }
        let jtj = jac.transpose() * &jac;

        // Inner loop: escalate damping until a step is accepted or the
        // iteration provably cannot move.
        loop {
            if evaluations >= cfg.max_evaluations {
                return Err(LmError::Budget { evaluations });
            }

            let Some(delta) = solve_damped(&jtj, &gradient, lambda) else {
                lambda *= cfg.lambda_up;
                if lambda > LAMBDA_MAX {
                    return Err(LmError::Singular);
                }
                continue;
            };

            let trial = &params + &delta;
            evaluations += 1;
            // A trial that cannot be evaluated, or that does not lower the
            // SSE, counts as a rejected step.
            let accepted = residuals(&trial).and_then(|r| {
                let s = r.norm_squared();
                (s.is_finite() && s < sse).then_some((r, s))
            });
            let step_small = delta.norm() <= cfg.xtol * (params.norm() + cfg.xtol);

            if let Some((trial_residual, trial_sse)) = accepted {
                let improvement = sse - trial_sse;
                params = trial;
                residual = trial_residual;
                sse = trial_sse;
                lambda = (lambda * cfg.lambda_down).max(LAMBDA_MIN);

                if sse == 0.0 || improvement <= cfg.ftol * sse || step_small {
                    return Ok(LmOutcome {
                        params,
                        sse,
                        evaluations,
                        iterations,
                    });
                }
                break;
            }

            // Rejected. If damping has already squeezed the step below the
            // xtol scale, no meaningful move remains: converged where we are.
            if step_small {
                return Ok(LmOutcome {
                    params,
                    sse,
                    evaluations,
                    iterations,
                });
            }
            lambda *= cfg.lambda_up;
            if lambda > LAMBDA_MAX {
                return Err(LmError::Singular);
            }
        }
    }
}
