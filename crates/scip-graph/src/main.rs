//! scip-graph CLI - Dependency graph queries from the command line.
//!
//! Converts a SCIP index into a `SQLite` store and answers traversal,
//! path, cycle, coupling, and complexity questions over it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use scip_graph::pipeline::{ChangeDetection, ConvertOptions, DEFAULT_BATCH_SIZE};
use tracing_subscriber::EnvFilter;

mod cli;

/// scip-graph: SCIP index to dependency graph converter and query engine.
#[derive(Parser)]
#[command(name = "scip-graph")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Store location (defaults to <project>/.scip-graph/graph.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a SCIP index into the store
    Index {
        /// SCIP index file, relative to the project root
        #[arg(default_value = "index.scip")]
        index: PathBuf,

        /// Rebuild the store from scratch
        #[arg(long)]
        force: bool,

        /// Skip documents matching this gitignore-style pattern (repeatable)
        #[arg(short, long = "ignore")]
        ignore: Vec<String>,

        /// How modified files are detected (mtime, git)
        #[arg(long, default_value = "mtime")]
        changes: ChangeDetection,

        /// Documents written per transaction
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Show what a file depends on, or what depends on it
    Deps {
        /// File path (relative to the project root)
        path: String,

        /// Show dependents instead of dependencies
        #[arg(short, long)]
        reverse: bool,

        /// Maximum number of hops
        #[arg(short, long, default_value = "1")]
        depth: u32,
    },

    /// Find the shortest dependency path between two files
    Path {
        /// Starting file
        from: String,
        /// Target file
        to: String,
    },

    /// Detect files that depend on each other
    Cycles {
        /// Maximum number of pairs to report
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// List mutually dependent pairs sharing many symbols
    Coupling {
        /// Minimum combined symbol count
        #[arg(short, long, default_value = "5")]
        threshold: u64,
    },

    /// Rank files by structural complexity
    Complexity {
        /// Sort key (complexity, symbols, stability)
        #[arg(short, long, default_value = "complexity")]
        sort: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List files few others depend on
    Leaves {
        /// Maximum number of dependents
        #[arg(short, long, default_value = "0")]
        max_dependents: u64,
    },

    /// Show run metadata and store totals
    Summary,

    /// Run a read-only SQL query against the store
    Query {
        /// SQL statement
        sql: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Determine project root
    let project = match cli.project {
        Some(p) => p,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };
    let db = cli
        .db
        .unwrap_or_else(|| scip_graph::default_store_path(&project));
    let ctx = cli::Context {
        project,
        db,
        json: cli.json,
    };

    // Run the appropriate command
    let result = match cli.command {
        Commands::Index {
            index,
            force,
            ignore,
            changes,
            batch_size,
        } => {
            let options = ConvertOptions::default()
                .with_force(force)
                .with_ignore_patterns(ignore)
                .with_change_detection(changes)
                .with_batch_size(batch_size);
            cli::index::run(&ctx, &index, &options)
        }
        Commands::Deps {
            path,
            reverse,
            depth,
        } => cli::deps::run(&ctx, &path, depth, reverse),
        Commands::Path { from, to } => cli::path::run(&ctx, &from, &to),
        Commands::Cycles { limit } => cli::cycles::run(&ctx, limit),
        Commands::Coupling { threshold } => cli::coupling::run(&ctx, threshold),
        Commands::Complexity { sort, limit } => cli::complexity::run(&ctx, &sort, limit),
        Commands::Leaves { max_dependents } => cli::leaves::run(&ctx, max_dependents),
        Commands::Summary => cli::summary::run(&ctx),
        Commands::Query { sql } => cli::query::run(&ctx, &sql),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            cli::print_error_hints(&e);
            ExitCode::FAILURE
        }
    }
}
