//! Command implementations and argument parsing for the treeline CLI.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{info, instrument};

use treeline_core::{
    dbscan, minimum_spanning_tree, Clustering, DbscanError, DbscanParams, MstError, Point,
    WeightedEdge,
};

const DEFAULT_NEIGHBOURS: usize = 1;
const DEFAULT_CORE_MIN_SIZE: usize = 1;
const DEFAULT_CLUSTER_MIN_SIZE: usize = 2;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "treeline",
    about = "Spanning trees and density clusters over point clouds."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Compute the Euclidean minimum spanning tree of a point file.
    Mst(MstCommand),
    /// Cluster a point file with DBSCAN.
    Dbscan(DbscanCommand),
}

impl Command {
    pub(super) fn name(&self) -> &'static str {
        match self {
            Command::Mst(_) => "mst",
            Command::Dbscan(_) => "dbscan",
        }
    }
}

/// Options accepted by the `mst` command.
#[derive(Debug, Args, Clone)]
pub struct MstCommand {
    /// Path to a point file: one point per line, 2 or 3 whitespace-separated
    /// coordinates, `#` starts a comment.
    pub path: PathBuf,

    /// Neighbour count for the mutual-reachability metric; 1 keeps plain
    /// Euclidean weights.
    #[arg(long = "neighbours", default_value_t = DEFAULT_NEIGHBOURS)]
    pub neighbours: usize,
}

/// Options accepted by the `dbscan` command.
#[derive(Debug, Args, Clone)]
pub struct DbscanCommand {
    /// Path to a point file: one point per line, 2 or 3 whitespace-separated
    /// coordinates, `#` starts a comment.
    pub path: PathBuf,

    /// Neighbourhood radius.
    #[arg(long)]
    pub eps: f32,

    /// Neighbours (the point itself included) required for a core point.
    #[arg(long = "core-min-size", default_value_t = DEFAULT_CORE_MIN_SIZE)]
    pub core_min_size: usize,

    /// Smallest cluster worth reporting.
    #[arg(long = "cluster-min-size", default_value_t = DEFAULT_CLUSTER_MIN_SIZE)]
    pub cluster_min_size: usize,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading the point file.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A line of the point file could not be parsed.
    #[error("`{path}` line {line}: {message}")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The point file's dimension is not supported.
    #[error("points must have 2 or 3 coordinates (got {got})")]
    UnsupportedDimension {
        /// Coordinate count of the first point row.
        got: usize,
    },
    /// Spanning-tree computation failed.
    #[error(transparent)]
    Mst(#[from] MstError),
    /// Clustering failed.
    #[error(transparent)]
    Dbscan(#[from] DbscanError),
}

/// A point cloud of either supported dimension.
#[derive(Debug, Clone)]
pub enum PointCloud {
    /// Two-dimensional points.
    Planar(Vec<Point<2>>),
    /// Three-dimensional points.
    Spatial(Vec<Point<3>>),
}

impl PointCloud {
    /// Number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PointCloud::Planar(points) => points.len(),
            PointCloud::Spatial(points) => points.len(),
        }
    }

    /// Returns whether the cloud holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    /// Result of the `mst` command.
    Mst {
        /// Number of points loaded.
        points: usize,
        /// The spanning tree's edges, endpoints as input line ranks.
        edges: Vec<WeightedEdge>,
    },
    /// Result of the `dbscan` command.
    Dbscan {
        /// Number of points loaded.
        points: usize,
        /// The reported clusters.
        clustering: Clustering,
    },
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, parsing, or execution fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = %cli.command.name()))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Mst(command) => run_mst(command),
        Command::Dbscan(command) => run_dbscan(command),
    }
}

#[instrument(
    name = "cli.mst",
    err,
    skip(command),
    fields(path = %path_label(&command.path), neighbours = command.neighbours)
)]
fn run_mst(command: MstCommand) -> Result<ExecutionSummary, CliError> {
    let cloud = load_points(&command.path)?;
    let points = cloud.len();
    let edges = match cloud {
        PointCloud::Planar(points) => minimum_spanning_tree(&points, command.neighbours)?,
        PointCloud::Spatial(points) => minimum_spanning_tree(&points, command.neighbours)?,
    };

    let total: f64 = edges.iter().map(|edge| f64::from(edge.weight())).sum();
    info!(points, edges = edges.len(), total, "spanning tree computed");
    Ok(ExecutionSummary::Mst { points, edges })
}

#[instrument(
    name = "cli.dbscan",
    err,
    skip(command),
    fields(
        path = %path_label(&command.path),
        eps = command.eps,
        core_min_size = command.core_min_size,
        cluster_min_size = command.cluster_min_size
    )
)]
fn run_dbscan(command: DbscanCommand) -> Result<ExecutionSummary, CliError> {
    let params = DbscanParams::new(command.eps, command.core_min_size, command.cluster_min_size)?;
    let cloud = load_points(&command.path)?;
    let points = cloud.len();
    let clustering = match cloud {
        PointCloud::Planar(points) => dbscan(&points, &params)?,
        PointCloud::Spatial(points) => dbscan(&points, &params)?,
    };

    info!(points, clusters = clustering.cluster_count(), "clustering computed");
    Ok(ExecutionSummary::Dbscan { points, clustering })
}

/// Loads a whitespace-separated point file, inferring the dimension from the
/// first data row.
///
/// # Errors
/// Returns [`CliError`] for unreadable files, malformed rows, or unsupported
/// dimensions.
pub fn load_points(path: &Path) -> Result<PointCloud, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows: Vec<(usize, Vec<f32>)> = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let value: f32 = token.parse().map_err(|_| CliError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: format!("`{token}` is not a number"),
            })?;
            row.push(value);
        }
        rows.push((index + 1, row));
    }

    let dimension = rows.first().map_or(2, |(_, row)| row.len());
    if dimension != 2 && dimension != 3 {
        return Err(CliError::UnsupportedDimension { got: dimension });
    }
    if let Some((line, row)) = rows.iter().find(|(_, row)| row.len() != dimension) {
        return Err(CliError::Parse {
            path: path.to_path_buf(),
            line: *line,
            message: format!(
                "expected {dimension} coordinates, found {}",
                row.len()
            ),
        });
    }

    Ok(if dimension == 2 {
        PointCloud::Planar(
            rows.into_iter()
                .map(|(_, row)| Point::new([row[0], row[1]]))
                .collect(),
        )
    } else {
        PointCloud::Spatial(
            rows.into_iter()
                .map(|(_, row)| Point::new([row[0], row[1], row[2]]))
                .collect(),
        )
    })
}

/// Renders `summary` to `writer` in a line-oriented text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Mst { points, edges } => {
            let total: f64 = edges.iter().map(|edge| f64::from(edge.weight())).sum();
            writeln!(writer, "points: {points}")?;
            writeln!(writer, "edges: {}", edges.len())?;
            writeln!(writer, "total weight: {total}")?;
            for edge in edges {
                writeln!(writer, "{}\t{}\t{}", edge.source(), edge.target(), edge.weight())?;
            }
        }
        ExecutionSummary::Dbscan { points, clustering } => {
            writeln!(writer, "points: {points}")?;
            writeln!(writer, "clusters: {}", clustering.cluster_count())?;
            for (cluster, members) in clustering.iter().enumerate() {
                for member in members {
                    writeln!(writer, "{member}\t{cluster}")?;
                }
            }
        }
    }
    Ok(())
}

/// Produce a label for a path that avoids leaking absolute directories.
fn path_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_owned())
}
