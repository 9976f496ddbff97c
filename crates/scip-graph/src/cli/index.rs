//! `scip-graph index` command implementation.

use std::path::Path;

use colored::Colorize;
use scip_graph::RunMode;
use scip_graph::pipeline::{self, ConvertOptions};

use super::Context;
use super::display::print_json;

const MAX_ERRORS_SHOWN: usize = 5;

/// Run the index command.
pub fn run(ctx: &Context, index: &Path, options: &ConvertOptions) -> Result<(), scip_graph::Error> {
    let index = if index.is_absolute() {
        index.to_path_buf()
    } else {
        ctx.project().join(index)
    };

    if !ctx.json {
        println!("{} {}...", "Converting".cyan().bold(), index.display());
        if options.force {
            println!("{}", "Rebuilding store from scratch".yellow());
        }
    }

    let stats = pipeline::convert(&index, &ctx.db, ctx.project(), options)?;

    if ctx.json {
        return print_json(&stats);
    }

    let mode = match stats.mode {
        RunMode::Full => "full".magenta(),
        RunMode::Incremental => "incremental".blue(),
    };

    println!();
    println!(
        "{} {} files ({} run), {} symbols",
        "Stored".green().bold(),
        stats.total_files,
        mode,
        stats.total_symbols
    );
    println!(
        "{}: {} converted, {} deleted",
        "Changes".dimmed(),
        stats.changed_files,
        stats.deleted_files
    );
    println!("{}: {} ms", "Duration".dimmed(), stats.time_ms);

    if !stats.errors.is_empty() {
        println!();
        println!("{} ({}):", "Skipped documents".red().bold(), stats.errors.len());
        for err in stats.errors.iter().take(MAX_ERRORS_SHOWN) {
            let path = if err.path.is_empty() { "<empty path>" } else { err.path.as_str() };
            println!("  {} {}: {}", "•".red(), path, err.message);
        }
        if stats.errors.len() > MAX_ERRORS_SHOWN {
            println!("  ... and {} more", stats.errors.len() - MAX_ERRORS_SHOWN);
        }
    }

    Ok(())
}
