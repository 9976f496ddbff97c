//! `scip-graph path` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the path command.
pub fn run(ctx: &Context, from: &str, to: &str) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let path = graph.find_path(from, to)?;

    if ctx.json {
        return print_json(&path);
    }

    println!(
        "{} ({} {}):",
        "Dependency path".cyan().bold(),
        path.distance,
        if path.distance == 1 { "hop" } else { "hops" }
    );
    let arrow = " → ".dimmed().to_string();
    println!("  {}", path.files.join(arrow.as_str()));

    Ok(())
}
