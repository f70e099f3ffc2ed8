//! Error types for deploytest operations.
//!
//! This module defines [`DeployTestError`], the error type for everything
//! that can abort a run before or around the deployments themselves, and a
//! [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Startup problems (environment, inputs, config) are `DeployTestError`
//!   variants and end the process with exit code 1
//! - Failures inside an attempt are never errors: they come back as
//!   [`ErrorRecord`](crate::report::ErrorRecord) values
//! - Cleanup and telemetry failures are logged and dropped

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for deploytest operations.
#[derive(Debug, Error)]
pub enum DeployTestError {
    /// One or more required environment variables are unset or empty.
    #[error("Environment is not set, must specify: {}", names.join(", "))]
    MissingEnvironment { names: Vec<String> },

    /// An environment variable is present but unusable.
    #[error("Invalid value for {name}: {message}")]
    InvalidEnvironment { name: String, message: String },

    /// A required command-line input was not provided.
    #[error("{what} is not provided")]
    MissingInput { what: String },

    /// A file the run depends on does not exist.
    #[error("Not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// An error pattern failed to compile.
    #[error("Invalid error pattern '{name}': {message}")]
    InvalidPattern { name: String, message: String },

    /// A process could not be started or waited on.
    #[error("Command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },

    /// A run-level setup step (login, secrets) failed.
    #[error("Error [{step}]: {output}")]
    SetupStepFailed { step: String, output: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for deploytest operations.
pub type Result<T> = std::result::Result<T, DeployTestError>;
