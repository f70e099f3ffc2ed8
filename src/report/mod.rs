//! Failure classification and reporting.
//!
//! - [`ErrorRecord`] - A classified failure of one attempt
//! - [`ErrorPatterns`] - Ordered regexes mapping step output to error kinds
//! - [`ReportManager`] - Shared classifier and failure log; writes the report

pub mod manager;
pub mod patterns;
pub mod record;

pub use manager::{ErrorSummary, ReportManager, TestReport, TEST_REPORT};
pub use patterns::{ErrorPattern, ErrorPatterns, PatternSpec};
pub use record::{
    ErrorRecord, CLASS_UNKNOWN, ERR_FILE_ACCESS, ERR_NODE_COUNT, ERR_ORCHESTRATOR_TYPE,
    ERR_ORCHESTRATOR_VERSION, ERR_SUCCESS, ERR_UNSPECIFIED, PHASE_PRE_RUN, STEP_PRETEST,
};
