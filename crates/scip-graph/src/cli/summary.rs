//! `scip-graph summary` command implementation.

use colored::Colorize;
use scip_graph::db::metadata;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the summary command.
pub fn run(ctx: &Context) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let summary = graph.summary()?;

    if ctx.json {
        return print_json(&summary);
    }

    let get = |key: &str| {
        summary
            .metadata
            .get(key)
            .map_or("-", String::as_str)
            .to_string()
    };

    println!("{}", "Store Summary".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();
    println!("{}: {}", "Store".bold(), graph.db_path().display());
    println!("{}: {}", "Last indexed".bold(), get(metadata::LAST_INDEXED));
    println!("{}: {}", "Last mode".bold(), get(metadata::LAST_MODE));
    if summary.metadata.contains_key(metadata::SCIP_TOOL) {
        println!(
            "{}: {} {}",
            "Indexer".bold(),
            get(metadata::SCIP_TOOL),
            get(metadata::SCIP_TOOL_VERSION)
        );
    }

    let totals = &summary.totals;
    println!();
    println!("{}:", "Totals".bold());
    println!("  {:<14} {}", "files", totals.files);
    println!("  {:<14} {}", "symbols", totals.symbols);
    println!("  {:<14} {}", "dependencies", totals.dependencies);
    println!("  {:<14} {}", "references", totals.references);
    println!("  {:<14} {}", "packages", totals.packages);

    Ok(())
}
