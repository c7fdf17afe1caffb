//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::plugin::discovery::{discover, Exclusions, FsDirectory};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config directory or one of its files could not be read.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TOML unit failed to parse.
    #[error("parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A JSON unit failed to parse.
    #[error("parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file extension is not a known config format.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A namespace did not match its typed schema.
    #[error("invalid '{namespace}' settings: {source}")]
    Schema {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A parsed configuration file, keyed by its namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUnit {
    pub namespace: String,
    pub value: Value,
}

/// Scan `dir` and parse every config unit in discovery order.
///
/// `index.*` files and dotfiles are skipped. A missing directory yields no
/// units; any other enumeration failure is returned unchanged.
pub fn load_units(dir: &Path) -> Result<Vec<ConfigUnit>, ConfigError> {
    let directory = FsDirectory::new(dir);
    let discovered = discover(&directory, Exclusions::standard()).map_err(|source| {
        ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        }
    })?;

    discovered
        .iter()
        .map(|unit| {
            let path = dir.join(&unit.file_name);
            let value = parse_unit(&path)?;
            Ok(ConfigUnit {
                namespace: unit.stem,
                value,
            })
        })
        .collect()
}

/// Parse one config file according to its extension.
pub fn parse_unit(path: &Path) -> Result<Value, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let read = || {
        fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    match extension {
        "toml" => {
            let table: toml::Table = toml::from_str(&read()?).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_value(table).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        "json" => serde_json::from_str(&read()?).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_yields_no_units() {
        let dir = tempfile::tempdir().unwrap();
        let units = load_units(&dir.path().join("config")).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn skips_index_and_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.toml"), "a = 1").unwrap();
        fs::write(dir.path().join(".hidden.toml"), "a = 1").unwrap();
        fs::write(dir.path().join("app.toml"), "port = 4000").unwrap();
        fs::write(dir.path().join("mail.json"), r#"{"driver":"smtp"}"#).unwrap();

        let units = load_units(dir.path()).unwrap();
        let names: Vec<_> = units.iter().map(|u| u.namespace.as_str()).collect();
        assert_eq!(names, vec!["app", "mail"]);
        assert_eq!(units[0].value["port"], 4000);
        assert_eq!(units[1].value["driver"], "smtp");
    }

    #[test]
    fn unsupported_extension_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.yaml"), "port: 1").unwrap();
        let err = load_units(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn malformed_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.toml"), "port = ").unwrap();
        let err = load_units(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("app.toml"));
    }
}
