//! Command-line interface orchestration for treeline.
//!
//! Offers `mst` and `dbscan` commands over whitespace-separated point files
//! and renders line-oriented results to stdout.

mod commands;

pub use commands::{
    load_points, render_summary, run_cli, Cli, CliError, Command, DbscanCommand,
    ExecutionSummary, MstCommand, PointCloud,
};
