//! `scip-graph query` command implementation.

use colored::Colorize;
use scip_graph::graph::FileGraphOps;

use super::Context;
use super::display::print_json;

/// Run the query command.
pub fn run(ctx: &Context, sql: &str) -> Result<(), scip_graph::Error> {
    let graph = ctx.graph()?;
    let result = graph.query(sql)?;

    if ctx.json {
        return print_json(&result);
    }

    println!("{}", result.columns.join("\t").bold());
    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "NULL".dimmed().to_string(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }

    println!();
    println!("{}", format!("({} rows)", result.rows.len()).dimmed());

    Ok(())
}
