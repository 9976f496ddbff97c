//! `scip-graph coupling` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the coupling command.
pub fn run(ctx: &Context, threshold: u64) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let pairs = graph.coupling(threshold)?;

    if ctx.json {
        return print_json(&pairs);
    }

    if pairs.is_empty() {
        println!(
            "{}",
            format!("No mutually dependent pairs share {threshold} or more symbols.").green()
        );
        return Ok(());
    }

    println!(
        "{} (threshold {}):",
        "Tightly coupled files".cyan().bold(),
        threshold
    );
    println!();

    for pair in &pairs {
        println!(
            "  {} {} {}",
            pair.total.to_string().red().bold(),
            "symbols".dimmed(),
            format!("(→ {}, ← {})", pair.a_to_b, pair.b_to_a).dimmed()
        );
        println!("    {} ⇄ {}", pair.file_a, pair.file_b);
    }

    Ok(())
}
