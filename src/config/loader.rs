//! Deployment configuration loading and validation.

use crate::config::schema::TestConfig;
use crate::error::{DeployTestError, Result};
use std::fs;
use std::path::Path;

/// Load and validate a deployment configuration file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist, `ConfigParseError`
/// for malformed JSON, and `ConfigValidationError` if a deployment is
/// missing its cluster definition or location.
pub fn load_test_config(path: &Path) -> Result<TestConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeployTestError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DeployTestError::Io(e)
        }
    })?;

    let config = parse_test_config(&content, path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration content; `source_path` is used in error messages.
pub fn parse_test_config(content: &str, source_path: &Path) -> Result<TestConfig> {
    serde_json::from_str(content).map_err(|e| DeployTestError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Check that every deployment names a cluster definition and a location.
pub fn validate(config: &TestConfig) -> Result<()> {
    for (index, dep) in config.deployments.iter().enumerate() {
        if dep.cluster_definition.trim().is_empty() {
            return Err(DeployTestError::ConfigValidationError {
                message: format!("deployment {} has no cluster_definition", index),
            });
        }
        if dep.location.trim().is_empty() {
            return Err(DeployTestError::ConfigValidationError {
                message: format!(
                    "deployment {} ({}) has no location",
                    index, dep.cluster_definition
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FOUR_DEPLOYMENTS: &str = r#"
{"deployments":
  [
    {"cluster_definition":"examples/dcos-1.8.json", "location":"westus"},
    {"cluster_definition":"examples/dcos-1.9.json", "location":"eastus"},
    {"cluster_definition":"examples/dcos-1.10.json", "location":"southcentralus"},
    {"cluster_definition":"examples/dcos-1.11.json", "location":"westus2"}
  ]
}
"#;

    #[test]
    fn parses_deployments_in_order() {
        let config = parse_test_config(FOUR_DEPLOYMENTS, Path::new("t.json")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.deployments.len(), 4);
        assert_eq!(config.deployments[2].location, "southcentralus");
    }

    #[test]
    fn rejects_missing_location() {
        let json = r#"{"deployments":[{"cluster_definition":"a.json","location":""}]}"#;
        let config = parse_test_config(json, Path::new("t.json")).unwrap();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, DeployTestError::ConfigValidationError { .. }));
        assert!(err.to_string().contains("a.json"));
    }

    #[test]
    fn rejects_missing_cluster_definition() {
        let json = r#"{"deployments":[{"cluster_definition":" ","location":"westus"}]}"#;
        let config = parse_test_config(json, Path::new("t.json")).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_test_config("{\"deployments\": [", Path::new("bad.json")).unwrap_err();
        match err {
            DeployTestError::ConfigParseError { path, .. } => {
                assert_eq!(path, PathBuf::from("bad.json"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_test_config(Path::new("/nonexistent/tests.json")).unwrap_err();
        assert!(matches!(err, DeployTestError::ConfigNotFound { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tests.json");
        std::fs::write(&path, FOUR_DEPLOYMENTS).unwrap();

        let config = load_test_config(&path).unwrap();
        assert_eq!(config.deployments[0].cluster_definition, "examples/dcos-1.8.json");
    }
}
