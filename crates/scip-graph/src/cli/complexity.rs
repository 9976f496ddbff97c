//! `scip-graph complexity` command implementation.

use colored::Colorize;
use scip_graph::graph::{ComplexitySort, FileGraphOps};

use super::Context;
use super::display::{format_ratio, print_json};

/// Run the complexity command.
pub fn run(ctx: &Context, sort: &str, limit: usize) -> Result<(), scip_graph::Error> {
    let sort: ComplexitySort = sort.parse()?;
    let graph = ctx.graph()?;
    let files = graph.complexity(sort, limit)?;

    if ctx.json {
        return print_json(&files);
    }

    if files.is_empty() {
        println!("{}", "No files in the store.".dimmed());
        return Ok(());
    }

    println!(
        "{:>7}  {:>7}  {:>4}  {:>4}  {:>9}  {}",
        "score".bold(),
        "symbols".bold(),
        "out".bold(),
        "in".bold(),
        "stability".bold(),
        "path".bold()
    );

    for file in &files {
        println!(
            "{:>7}  {:>7}  {:>4}  {:>4}  {:>9}  {}",
            file.score.to_string().yellow(),
            file.symbol_count,
            file.outgoing,
            file.incoming,
            format_ratio(file.stability),
            file.path
        );
    }

    Ok(())
}
