//! `scip-graph cycles` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the cycles command.
pub fn run(ctx: &Context, limit: usize) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let cycles = graph.two_node_cycles(limit)?;

    if ctx.json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("{}", "No circular dependencies detected.".green());
        return Ok(());
    }

    println!(
        "Found {} mutually dependent file pairs:",
        cycles.len().to_string().red().bold()
    );
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        println!("  {} {}:", "Cycle".yellow().bold(), i + 1);
        // Already closed: a → b → a
        println!("    {}", cycle.files.join(" → ").dimmed());
    }

    if cycles.len() == limit {
        println!();
        println!(
            "{}",
            format!("Showing the first {limit}; raise --limit to see more.").dimmed()
        );
    }

    Ok(())
}
