//! Subcommand dispatch.
//!
//! `src/main.rs` only maps the result of [`run`] to an exit code; the real
//! entry point lives here. Each `dca` subcommand gets a `handle_*` function,
//! and the ingest → fit → residuals workflow they share sits in
//! [`pipeline`].

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, SampleArgs, picker};
use crate::data::SampleSpec;
use crate::domain::FitConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `dca` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let csv_path = match &args.file {
        Some(path) => picker::validate_csv_path(path)?,
        None => picker::prompt_for_csv_path()?,
    };
    let config = fit_config_from_args(&args, csv_path);
    let run = pipeline::run_fit(&config)?;

    for err in run.ingest.row_errors.iter().take(5) {
        eprintln!("warning: line {}: {}", err.line, err.message);
    }
    if run.ingest.row_errors.len() > 5 {
        eprintln!(
            "warning: {} more row(s) skipped",
            run.ingest.row_errors.len() - 5
        );
    }

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.fit, &config)
    );

    if config.residual_rows > 0 {
        println!(
            "{}",
            crate::report::format_residual_table(&run.residuals, config.residual_rows)
        );
    }

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.residuals,
            &run.fit,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if let Some(path) = &config.export_curve {
        let source = config.csv_path.display().to_string();
        crate::io::curve::write_curve_json(path, &run.fit, &run.ingest.stats, &source)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;

    println!(
        "{} decline (fitted {} from {})",
        curve.model.display_name, curve.generated, curve.source
    );
    for line in crate::report::parameter_readout(&curve.model) {
        println!("- {line}");
    }
    println!();

    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = SampleSpec {
        kind: args.model,
        qi: args.qi,
        di: args.di,
        b: args.b,
        n_points: args.n_points,
        t_max: args.t_max,
        noise_sd: args.noise,
        seed: args.seed,
    };
    let sample = crate::data::generate_sample(&spec)?;
    crate::io::export::write_sample_csv(&args.out, &sample.points)?;

    println!(
        "Wrote {} points to {} ({} decline truth):",
        sample.points.len(),
        args.out.display(),
        sample.truth.display_name
    );
    for line in crate::report::parameter_readout(&sample.truth) {
        println!("- {line}");
    }

    Ok(())
}

fn handle_tui(args: FitArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

pub fn fit_config_from_args(args: &FitArgs, csv_path: std::path::PathBuf) -> FitConfig {
    FitConfig {
        csv_path,
        model: args.model,
        max_evaluations: args.max_evals,
        residual_rows: args.residual_rows,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
    }
}

/// Rewrite argv so a bare `dca` invocation launches the TUI.
///
/// Clap insists on a subcommand name, but `dca` and `dca -m harmonic`
/// should behave like `dca tui ...`. Top-level help/version requests and
/// explicit subcommands pass through untouched.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    match argv.get(1).map(String::as_str) {
        None => argv.push("tui".to_string()),
        Some("-h" | "--help" | "-V" | "--version" | "help") => {}
        Some("fit" | "plot" | "sample" | "tui") => {}
        Some(flag) if flag.starts_with('-') => argv.insert(1, "tui".to_string()),
        Some(_) => {}
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::rewrite_args;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_tui() {
        assert_eq!(rewrite_args(argv(&["dca"])), argv(&["dca", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["dca", "-m", "harmonic"])),
            argv(&["dca", "tui", "-m", "harmonic"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        for first in ["fit", "plot", "sample", "tui", "--help", "-V", "help"] {
            let args = argv(&["dca", first]);
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }
}
