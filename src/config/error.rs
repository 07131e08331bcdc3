//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking `folio.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid folio.toml")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("site/folio.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.starts_with("Cannot read"));
        assert!(display.contains("site/folio.toml"));

        let err = toml::from_str::<toml::Table>("[x").unwrap_err();
        let display = format!("{}", ConfigError::from(err));
        assert_eq!(display, "Invalid folio.toml");

        let validation_err = ConfigError::Validation("segment is empty".to_string());
        assert_eq!(format!("{validation_err}"), "Invalid configuration: segment is empty");
    }
}
