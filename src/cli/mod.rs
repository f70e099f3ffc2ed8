//! Command-line interface.
//!
//! - [`Cli`] - Argument definitions (clap derive)
//! - [`RunCommand`] - Wires settings, config, steps and the scheduler into a run

pub mod args;
pub mod commands;

pub use args::{Cli, DEFAULT_ERRORS_FILE};
pub use commands::{CommandResult, RunCommand};
