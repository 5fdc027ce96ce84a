//! Arps decline-curve analysis for well production data.
//!
//! The `dca` binary is a thin wrapper over this library crate, which keeps
//! the model evaluation, the Levenberg–Marquardt fitting, and the reporting
//! testable without spawning a process. The dependency direction is
//! `models` ← `fit` ← everything else; the presentation modules (`report`,
//! `plot`, `tui`) only consume fit results.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
