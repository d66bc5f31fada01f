//! Board graph command-line tool.
//!
//! `boardctl` applies operation batches to a board file through the same
//! [`SyncAdapter`](board_sync::SyncAdapter) an embedding host uses, and runs
//! read-only queries and analytics over a board. Results are printed as JSON
//! on stdout; logs go to stderr and are controlled by `RUST_LOG`.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use board_cli::commands::{self, QueryArgs};
use board_core::NeighborDirection;

/// Board graph tools.
#[derive(Parser)]
#[command(name = "boardctl", about = "Board graph tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON array (or single object) of operations to a board file.
    Apply {
        /// Path to the board file; created if missing.
        #[arg(short, long)]
        board: PathBuf,

        /// Path to the operations file.
        #[arg(short, long)]
        ops: PathBuf,

        /// Follow-up persist delays in milliseconds, comma separated.
        #[arg(long)]
        persist_delay_ms: Option<String>,
    },
    /// List nodes matching every given filter.
    Query {
        #[arg(short, long)]
        board: PathBuf,

        /// Node type: text, file, link or group.
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,

        /// Case-insensitive substring of a text node's body.
        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        color: Option<String>,

        /// Substring of a file node's path.
        #[arg(long)]
        file: Option<String>,
    },
    /// Depth-first walk from one node.
    Traverse {
        #[arg(short, long)]
        board: PathBuf,

        /// Start node id.
        #[arg(short, long)]
        start: String,

        #[arg(short, long, value_enum, default_value = "outgoing")]
        direction: DirectionArg,

        /// Deepest level to visit (start is 0).
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print roots, leaves, cycles, levels and components.
    Analyze {
        #[arg(short, long)]
        board: PathBuf,

        /// Include a hierarchical layout.
        #[arg(long)]
        layout: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Outgoing,
    Incoming,
    Both,
}

impl From<DirectionArg> for NeighborDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Outgoing => NeighborDirection::Outgoing,
            DirectionArg::Incoming => NeighborDirection::Incoming,
            DirectionArg::Both => NeighborDirection::Both,
        }
    }
}

/// Exit codes: 0 = success, 1 = some operations failed, 2 = the board
/// could not be read or written during apply, 3 = usage or I/O error.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Apply {
            board,
            ops,
            persist_delay_ms,
        } => match commands::apply(&board, &ops, persist_delay_ms.as_deref()).await {
            Ok(report) => {
                let code = if !report.success {
                    2
                } else if report.failure_count() > 0 {
                    1
                } else {
                    0
                };
                if print_json(&report) {
                    code
                } else {
                    3
                }
            }
            Err(e) => fail(e),
        },
        Commands::Query {
            board,
            node_type,
            text,
            color,
            file,
        } => {
            let args = QueryArgs {
                node_type,
                text,
                color,
                file,
            };
            finish(commands::query(&board, &args))
        }
        Commands::Traverse {
            board,
            start,
            direction,
            max_depth,
        } => finish(commands::traverse(&board, &start, direction.into(), max_depth)),
        Commands::Analyze { board, layout } => finish(commands::analyze(&board, layout)),
    };
    process::exit(exit_code);
}

fn finish(result: anyhow::Result<Value>) -> i32 {
    match result {
        Ok(value) if print_json(&value) => 0,
        Ok(_) => 3,
        Err(e) => fail(e),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Error: failed to serialize result: {}", e);
            false
        }
    }
}

fn fail(e: anyhow::Error) -> i32 {
    eprintln!("Error: {:#}", e);
    3
}
