//! Interactive well-file picker.
//!
//! Kept apart from clap on purpose: clap owns structured flags, while this
//! module covers the "just run `dca` and point it at a well" flow. It walks
//! the working directory for `*.csv` candidates and lets the user pick one
//! by number or type a path directly.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// How deep below the working directory the walk descends.
const MAX_WALK_DEPTH: usize = 4;

/// What the user typed at the prompt.
enum Selection {
    Quit,
    Index(usize),
    Path(PathBuf),
}

fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) => Selection::Index(n),
        Err(_) => Selection::Path(PathBuf::from(input)),
    }
}

/// Ask the user to choose a production CSV.
///
/// Lists discovered `*.csv` files; accepts a list number or an explicit
/// path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::usage(
            "No .csv files found. Provide one with `dca fit -f <file.csv>`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::usage(format!("Failed to write prompt: {e}")))?;

        let mut line = String::new();
        let bytes = io::stdin()
            .read_line(&mut line)
            .map_err(|e| AppError::usage(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            // Stdin closed (piped invocation, Ctrl-D).
            return Err(AppError::usage(
                "No input received. Provide a CSV path with `dca fit -f <file.csv>`.",
            ));
        }

        match parse_selection(&line) {
            Selection::Quit => return Err(AppError::usage("Canceled.")),
            Selection::Index(n) if (1..=files.len()).contains(&n) => {
                return validate_csv_path(&files[n - 1]);
            }
            Selection::Index(n) => {
                println!("Invalid choice: {n}. Enter a number between 1 and {}.", files.len());
            }
            Selection::Path(candidate) => match validate_csv_path(&candidate) {
                Ok(path) => return Ok(path),
                Err(err) => println!("{err}"),
            },
        }
    }
}

/// Check that `path` names an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::usage(format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::usage(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    if !has_csv_extension(path) {
        return Err(AppError::usage(format!(
            "Expected a .csv file (got: {}). Use -f to pass a CSV path.",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Find `*.csv` files under the working directory, in a stable order.
pub fn discover_csv_files() -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending: Vec<(PathBuf, usize)> = vec![(PathBuf::from("."), 0)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if depth < MAX_WALK_DEPTH && !should_skip_dir(&path) {
                    pending.push((path, depth + 1));
                }
            } else if file_type.is_file() && has_csv_extension(&path) {
                found.push(path);
            }
        }
    }

    found.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    found
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || matches!(name, "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}
