//! Configuration loading, parsing, and validation.
//!
//! This module handles all aspects of configuration:
//! - Deployment schema in [`schema`]
//! - File loading and validation in [`loader`]
//! - Run settings from the CI environment in [`settings`]
//! - Scenario env files in [`env_file`]
//! - Ordered step environments in [`environment`]
//!
//! # Example
//!
//! ```
//! use deploytest::config::{load_test_config, Deployment};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("tests.json");
//! fs::write(
//!     &path,
//!     r#"{"deployments":[{"cluster_definition":"dcos.json","location":"westus"}]}"#,
//! )
//! .unwrap();
//!
//! let config = load_test_config(&path).unwrap();
//! assert_eq!(config.deployments, vec![Deployment::new("dcos.json", "westus")]);
//! ```

pub mod env_file;
pub mod environment;
pub mod loader;
pub mod schema;
pub mod settings;

pub use env_file::EnvFileParser;
pub use environment::EnvList;
pub use loader::{load_test_config, parse_test_config, validate};
pub use schema::{Deployment, TestConfig, DEFAULT_TEST_CATEGORY};
pub use settings::{RunSettings, DEFAULT_RESOURCE_GROUP_PREFIX, DEFAULT_RETRIES, REQUIRED_VARS};
