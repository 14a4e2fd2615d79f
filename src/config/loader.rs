//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{ProxyConfig, ProxyOptions};
use crate::config::validation::ValidationReport;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(#[from] ValidationReport),
}

/// Read raw options from a TOML file. Nothing is validated yet.
pub fn load_options(path: &Path) -> Result<ProxyOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options = toml::from_str(&content)?;
    Ok(options)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    Ok(load_options(path)?.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[test]
    fn test_parse_options() {
        let options: ProxyOptions = toml::from_str(
            r#"
            port = 8080
            auth = true
            digest = "sha256"
            secret = "foobar"
            sign_header = "Gap-Signature"
            headers = ["Content-Type", "Date"]
            bind_address = "0.0.0.0"
            "#,
        )
        .unwrap();

        assert_eq!(options.headers, ["Content-Type", "Date"]);
        assert_eq!(options.log_level, "info");
        let config = options.validate().unwrap();
        assert_eq!(config.mode, Mode::AuthenticateOnly);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_file_reports_every_problem() {
        let path = std::env::temp_dir().join(format!("hmac-proxy-{}.toml", std::process::id()));
        fs::write(&path, "port = -1\n").unwrap();
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        let ConfigError::Invalid(report) = err else {
            panic!("expected a validation report, got {:?}", err);
        };
        assert_eq!(report.len(), 4);
    }
}
