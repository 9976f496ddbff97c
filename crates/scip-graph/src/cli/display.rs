//! Common display utilities for CLI commands.

use colored::Colorize;
use serde::Serialize;
use scip_graph::{Error, QueryError};

const MAX_DISPLAY_ITEMS: usize = 10;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Internal(format!("failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Display a list of paths with optional truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` paths with bullet points. If there are more,
/// shows "... and N more". If empty, shows the provided `empty_message`.
pub fn print_paths<S: AsRef<str>>(paths: &[S], empty_message: &str) {
    if paths.is_empty() {
        println!("    {}", empty_message.dimmed());
        return;
    }

    for path in paths.iter().take(MAX_DISPLAY_ITEMS) {
        println!("    {} {}", "•".dimmed(), path.as_ref());
    }

    if paths.len() > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            paths.len() - MAX_DISPLAY_ITEMS
        );
    }
}

/// Print follow-up hints for path lookup failures.
pub fn print_error_hints(error: &Error) {
    match error {
        Error::Query(QueryError::IsDirectory { candidates, .. }) => {
            eprintln!("  {}:", "files in this directory".dimmed());
            for candidate in candidates.iter().take(MAX_DISPLAY_ITEMS) {
                eprintln!("    {} {}", "•".dimmed(), candidate);
            }
            if candidates.len() > MAX_DISPLAY_ITEMS {
                eprintln!("    ... and {} more", candidates.len() - MAX_DISPLAY_ITEMS);
            }
        }
        Error::Query(QueryError::FileNotFound { suggestions, .. }) if suggestions.is_empty() => {
            eprintln!(
                "  {}: run `scip-graph index` if the file was added recently",
                "hint".cyan()
            );
        }
        _ => {}
    }
}

/// Format a stability ratio for display.
pub fn format_ratio(value: f64) -> String {
    format!("{value:.2}")
}
