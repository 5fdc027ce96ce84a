//! Command-line parsing for the decline curve analysis tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ModelKind;
use crate::fit::DEFAULT_MAX_EVALUATIONS;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dca", version, about = "Arps decline curve analysis for well production data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a decline model to a production CSV, print diagnostics, and optionally plot/export.
    Fit(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Generate a synthetic production history CSV.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying fit pipeline as `dca fit`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(FitArgs),
}

/// Common options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Production history CSV (columns: `time`, `production`). Prompts if omitted.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Decline model to fit.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Exponential)]
    pub model: ModelKind,

    /// Model evaluation budget for the fit.
    #[arg(long, default_value_t = DEFAULT_MAX_EVALUATIONS)]
    pub max_evals: usize,

    /// Show the N largest residuals.
    #[arg(long, default_value_t = 10)]
    pub residual_rows: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-point results (observed, fitted, residual) to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export curve (model + params + fitted grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `dca fit --export-curve`.
    #[arg(short = 'f', long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for generating a synthetic production history.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "sample_well.csv")]
    pub out: PathBuf,

    /// Decline model that generates the truth curve.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Hyperbolic)]
    pub model: ModelKind,

    /// True initial production rate q_i.
    #[arg(long, default_value_t = 1200.0)]
    pub qi: f64,

    /// True decline rate d_i.
    #[arg(long, default_value_t = 0.1)]
    pub di: f64,

    /// True hyperbolic exponent b (ignored unless the model is hyperbolic).
    #[arg(long, default_value_t = 0.8)]
    pub b: f64,

    /// Number of sample points.
    #[arg(short = 'n', long, default_value_t = 48)]
    pub n_points: usize,

    /// Last sample time (first is always 0).
    #[arg(long, default_value_t = 48.0)]
    pub t_max: f64,

    /// Multiplicative noise sigma (0 disables noise).
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}
