//! TOML secrets document.
//!
//! Values can live in a section named after the provider or in the generic
//! `[config]` section:
//!
//! ```toml
//! [openai]
//! api_key = "sk-..."
//! model = "gpt-5-mini"
//!
//! [config]
//! llm_provider = "openai"
//! temperature = 0.2
//! ```
//!
//! or as flat top-level keys named like the environment variables
//! (`OPENAI_API_KEY = "sk-..."`).

use crate::llm::config::ConfigError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, info};

/// Default secrets location, relative to the working directory
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Environment variable naming an alternative secrets file
pub const SECRETS_PATH_VAR: &str = "LOAN_CHECKLIST_SECRETS";

#[derive(Debug, Clone, Default)]
pub struct SecretsStore {
    table: Table,
    path: Option<PathBuf>,
}

impl SecretsStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table = content
            .parse::<Table>()
            .map_err(|e| ConfigError::SecretsMalformed(e.to_string()))?;
        Ok(Self { table, path: None })
    }

    /// Load a secrets file that must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigError::SecretsNotFound(path.display().to_string())
            } else {
                ConfigError::SecretsUnreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let mut store = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::SecretsMalformed(msg) => {
                ConfigError::SecretsMalformed(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        store.path = Some(path.to_path_buf());

        info!("Loaded secrets from {}", path.display());
        Ok(store)
    }

    /// Load a secrets file, treating a missing file as an empty store
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No secrets file at {}", path.display());
            return Ok(Self::empty());
        }
        Self::load(path)
    }

    /// Location the store was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Value of `key` under `[section]`
    pub fn section_value(&self, section: &str, key: &str) -> Option<String> {
        self.table
            .get(section)
            .and_then(Value::as_table)
            .and_then(|table| table.get(key))
            .and_then(scalar_to_string)
    }

    /// Top-level `key = value` entry
    pub fn flat_value(&self, key: &str) -> Option<String> {
        self.table.get(key).and_then(scalar_to_string)
    }
}

/// Render a scalar as text; blank strings and non-scalars count as absent
fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_nested_and_flat_values() {
        let store = SecretsStore::from_toml_str(
            r#"
OPENAI_API_KEY = "flat-key"

[deepseek]
api_key = "nested-key"
temperature = 0.5
"#,
        )
        .unwrap();

        assert_eq!(store.flat_value("OPENAI_API_KEY").as_deref(), Some("flat-key"));
        assert_eq!(
            store.section_value("deepseek", "api_key").as_deref(),
            Some("nested-key")
        );
        assert_eq!(
            store.section_value("deepseek", "temperature").as_deref(),
            Some("0.5")
        );
        assert_eq!(store.section_value("openai", "api_key"), None);
        assert_eq!(store.flat_value("deepseek"), None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let store = SecretsStore::from_toml_str("[openai]\napi_key = \"   \"\n").unwrap();
        assert_eq!(store.section_value("openai", "api_key"), None);
    }

    #[test]
    fn test_malformed_document() {
        let result = SecretsStore::from_toml_str("[openai\napi_key = 1");
        assert!(matches!(result, Err(ConfigError::SecretsMalformed(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[openai]\napi_key = \"file-key\"").unwrap();

        let store = SecretsStore::load(file.path()).unwrap();
        assert_eq!(
            store.section_value("openai", "api_key").as_deref(),
            Some("file-key")
        );
        assert_eq!(store.path(), Some(file.path()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            SecretsStore::load(&path),
            Err(ConfigError::SecretsNotFound(_))
        ));

        let store = SecretsStore::load_optional(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.path(), None);
    }
}
