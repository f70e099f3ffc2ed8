//! Error records for failed attempts.

use serde::{Deserialize, Serialize};

/// Error tag for a step that succeeded (used in duration metrics).
pub const ERR_SUCCESS: &str = "success";

/// Kind assigned when no pattern matches a step's output.
pub const ERR_UNSPECIFIED: &str = "UnspecifiedError";
/// Class paired with [`ERR_UNSPECIFIED`].
pub const CLASS_UNKNOWN: &str = "Unknown";

/// Discovery of the orchestrator type failed.
pub const ERR_ORCHESTRATOR_TYPE: &str = "OrchestratorTypeParsingError";
/// Discovery of the expected orchestrator version failed.
pub const ERR_ORCHESTRATOR_VERSION: &str = "OrchestratorVersionParsingError";
/// Discovery of the expected node counts failed or was malformed.
pub const ERR_NODE_COUNT: &str = "NodeCountParsingError";
/// The scenario env file exists but could not be read.
pub const ERR_FILE_ACCESS: &str = "FileAccessError";

/// Phase for failures that happen outside the main step sequence.
pub const PHASE_PRE_RUN: &str = "PreRun";
/// Step name recorded for failures before the first ordered step.
pub const STEP_PRETEST: &str = "pretest";

/// A classified failure of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Test name (cluster definition without extension).
    pub test_name: String,

    /// Step that failed.
    pub step: String,

    /// Error kind name.
    pub error: String,

    /// Phase (error class) the kind belongs to.
    pub phase: String,

    /// Deployment location.
    pub location: String,
}

impl ErrorRecord {
    pub fn new(
        test_name: impl Into<String>,
        step: impl Into<String>,
        error: impl Into<String>,
        phase: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            step: step.into(),
            error: error.into(),
            phase: phase.into(),
            location: location.into(),
        }
    }

    /// A failure outside the ordered step sequence.
    pub fn pre_run(test_name: &str, step: &str, error: &str, location: &str) -> Self {
        Self::new(test_name, step, error, PHASE_PRE_RUN, location)
    }
}
