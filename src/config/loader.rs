//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ShieldConfig;
use crate::config::validation::validate_config;
use crate::error::SecurityError;

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ShieldConfig, SecurityError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SecurityError::Configuration(format!("read {}: {e}", path.display())))?;
    let config: ShieldConfig = toml::from_str(&content)
        .map_err(|e| SecurityError::Configuration(format!("parse {}: {e}", path.display())))?;

    validate_config(&config).map_err(|errors| SecurityError::Configuration(errors.join("; ")))?;

    tracing::info!(
        path = %path.display(),
        environment = config.environment.as_str(),
        "Security configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("shield_test_config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "environment = \"testing\"").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.environment.as_str(), "testing");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = load_config(Path::new("/nonexistent/shield.toml")).unwrap_err();
        assert!(matches!(err, SecurityError::Configuration(_)));
    }
}
