//! `scip-graph deps` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the deps command.
pub fn run(ctx: &Context, path: &str, depth: u32, reverse: bool) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let target = graph.resolve_path(path)?;

    let files = if reverse {
        graph.dependents(&target, depth)?
    } else {
        graph.dependencies(&target, depth)?
    };

    if ctx.json {
        return print_json(&files);
    }

    let heading = if reverse { "Dependents of" } else { "Dependencies of" };
    println!(
        "{} {} (depth {}):",
        heading.cyan().bold(),
        target.white().bold(),
        depth
    );

    if files.is_empty() {
        let message = if reverse {
            "No files depend on this file."
        } else {
            "This file has no dependencies."
        };
        println!("  {}", message.dimmed());
        return Ok(());
    }

    let mut current_depth = 0;
    for file in &files {
        if file.depth != current_depth {
            current_depth = file.depth;
            println!("  {}", format!("depth {current_depth}").yellow());
        }
        println!("    {} {}", "•".dimmed(), file.path);
    }

    println!();
    println!("{}: {} files", "Total".dimmed(), files.len());

    Ok(())
}
