//! Treeline command-line interface library.
//!
//! Splits the binary's behaviour into testable modules: argument parsing and
//! command execution in [`cli`], logging bootstrap in [`logging`].

pub mod cli;
pub mod logging;
