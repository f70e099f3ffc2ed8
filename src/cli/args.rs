//! CLI argument definitions.

use clap::Parser;
use std::path::PathBuf;

/// Default error-classification file.
pub const DEFAULT_ERRORS_FILE: &str = "acs-engine-errors.json";

/// deploytest - Parallel regression runs of cluster deployments.
///
/// Run-level settings come from the environment: SERVICE_PRINCIPAL_CLIENT_ID,
/// SERVICE_PRINCIPAL_CLIENT_SECRET, TENANT_ID, SUBSCRIPTION_ID,
/// STAGE_TIMEOUT_MIN, JOB_BASE_NAME and BUILD_NUMBER are required.
#[derive(Debug, Clone, Parser)]
#[command(name = "deploytest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Deployment configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine executable, exported to steps as ACS_ENGINE_EXE
    #[arg(short = 'a', long, value_name = "FILE")]
    pub engine: Option<PathBuf>,

    /// Error classification file (JSON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_ERRORS_FILE)]
    pub errors: PathBuf,

    /// Directory containing script/step.sh (defaults to the executable's directory)
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
