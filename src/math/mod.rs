//! Mathematical utilities: the damped nonlinear least-squares core.

pub mod lm;

pub use lm::*;
