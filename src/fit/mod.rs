//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - seed a starting parameter vector from the observed data
//! - drive the Levenberg–Marquardt solver for the selected model
//! - classify solver failures into user-facing errors

pub mod fitter;
pub mod guess;

pub use fitter::*;
pub use guess::*;
