//! CLI entry point for the treeline spatial-analytics tools.
//!
//! Parses command-line arguments with clap, executes the requested
//! computation, renders the result to stdout, and maps errors to exit codes.
//! Logging is initialised eagerly so subsequent operations can emit
//! structured diagnostics via `tracing`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use treeline_cli::{
    cli::{render_summary, run_cli, Cli, CliError},
    logging::{self, LoggingError},
};

/// Parse CLI arguments, execute the command, render the summary, and flush
/// the output stream.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(cli_error) = err.downcast_ref::<CliError>() {
                log_cli_error(cli_error);
            } else {
                error!(error = %err, "command execution failed");
            }
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialised"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}

fn log_cli_error(err: &CliError) {
    match err {
        CliError::Mst(mst) => error!(
            error = %mst,
            code = mst.code().as_str(),
            "command execution failed"
        ),
        CliError::Dbscan(dbscan) => error!(
            error = %dbscan,
            code = dbscan.code().as_str(),
            "command execution failed"
        ),
        _ => error!(error = %err, "command execution failed"),
    }
}
