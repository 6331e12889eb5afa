//! Configuration for the records tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (records.toml)
//! - Environment variables (RECORDS__*)
//!
//! ## Example config file (records.toml):
//! ```toml
//! [catalog]
//! path = "./catalog"
//! roots = ["DictionaryEntity"]
//!
//! [output]
//! format = "pretty"
//! dir = "./out"
//!
//! [ingest]
//! default_schema = "DictionaryEntity"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::dictionary;
use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Where schemas come from
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// How records are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Document ingestion
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog file or directory; the built-in dictionary catalog when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Top-level schemas, exempt from the unreferenced-schema lint
    #[serde(default = "default_roots")]
    pub roots: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (pretty or compact)
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,

    /// Directory for normalized records; stdout when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Schema used when none is given on the command line
    #[serde(default = "default_schema")]
    pub default_schema: String,
}

// Default value functions
fn default_roots() -> Vec<String> {
    vec![dictionary::DICTIONARY_ENTITY.to_string()]
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_schema() -> String {
    dictionary::DICTIONARY_ENTITY.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            roots: default_roots(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            dir: None,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
        }
    }
}

impl RecordsConfig {
    /// Load configuration from the default locations, layering an explicit
    /// file on top when given
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["records.toml", ".records.toml", "config/records.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("pl", "diki", "records") {
            let xdg_config = config_dir.config_dir().join("records.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // RECORDS__OUTPUT__FORMAT=compact
        builder = builder.add_source(
            Environment::with_prefix("RECORDS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The configured catalog: a file, every file under a directory, or the
    /// built-in dictionary catalog
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog.path {
            Some(path) if path.is_dir() => Catalog::load_dir(path),
            Some(path) => Catalog::load(path),
            None => Ok(dictionary::catalog()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecordsConfig::default();
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert_eq!(config.ingest.default_schema, "DictionaryEntity");
        assert_eq!(config.catalog.roots, vec!["DictionaryEntity".to_string()]);
    }

    #[test]
    fn test_serialize_config() {
        let config = RecordsConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("format = \"pretty\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[output]\nformat = \"compact\"\n").unwrap();

        let config = RecordsConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert_eq!(config.ingest.default_schema, "DictionaryEntity");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.toml");

        let mut config = RecordsConfig::default();
        config.output.format = OutputFormat::Compact;
        config.output.dir = Some(PathBuf::from("normalized"));
        config.catalog.roots = vec!["Entry".to_string()];
        config.save(path.to_str().unwrap()).unwrap();

        let reloaded = RecordsConfig::load_from(path.to_str()).unwrap();
        assert_eq!(reloaded.output.format, OutputFormat::Compact);
        assert_eq!(reloaded.output.dir, Some(PathBuf::from("normalized")));
        assert_eq!(reloaded.catalog.roots, vec!["Entry".to_string()]);
        assert_eq!(reloaded.catalog.path, None);
    }

    #[test]
    fn test_default_catalog_is_dictionary() {
        let catalog = RecordsConfig::default().load_catalog().unwrap();
        assert!(catalog.get(dictionary::MEANING).is_some());
    }
}
