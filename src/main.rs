//! deploytest CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use deploytest::cli::{Cli, RunCommand};
use deploytest::ui::Console;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("deploytest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deploytest=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("deploytest starting with args: {:?}", cli);

    let console = Console::new();
    match RunCommand::new(cli).execute(&console) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            console.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
