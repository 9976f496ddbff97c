//! `scip-graph leaves` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::{print_json, print_paths};

/// Run the leaves command.
pub fn run(ctx: &Context, max_dependents: u64) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let leaves = graph.leaves(max_dependents)?;

    if ctx.json {
        return print_json(&leaves);
    }

    println!(
        "{} (at most {} dependents, tests and config excluded):",
        "Leaf files".cyan().bold(),
        max_dependents
    );

    let paths: Vec<String> = leaves
        .iter()
        .map(|leaf| {
            format!(
                "{} {}",
                leaf.path,
                format!("({} dependents, {} symbols)", leaf.dependent_count, leaf.symbol_count)
                    .dimmed()
            )
        })
        .collect();
    print_paths(&paths, "No matching files.");

    Ok(())
}
