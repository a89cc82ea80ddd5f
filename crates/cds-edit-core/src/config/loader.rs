//! Configuration file loading

use super::WriterConfiguration;
use crate::{CdsEditError, Result};
use std::path::Path;

/// Configuration loader for the writer configuration
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_json_str(content: &str) -> Result<WriterConfiguration> {
        let partial: WriterConfiguration =
            serde_json::from_str(content).map_err(|e| CdsEditError::Config {
                message: format!("Invalid JSON configuration: {e}"),
            })?;
        Ok(Self::merge(partial, WriterConfiguration::default()))
    }

    pub fn from_toml_str(content: &str) -> Result<WriterConfiguration> {
        let partial: WriterConfiguration =
            toml::from_str(content).map_err(|e| CdsEditError::Config {
                message: format!("Invalid TOML configuration: {e}"),
            })?;
        Ok(Self::merge(partial, WriterConfiguration::default()))
    }

    /// Load configuration from a file
    ///
    /// Supports JSON (.json) and TOML (.toml) formats
    pub fn load(path: &Path) -> Result<WriterConfiguration> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CdsEditError::io_error(path, e))?;
        tracing::debug!("Loading configuration from {}", path.display());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(CdsEditError::config_error(format!(
                "Unsupported configuration file '{}' (expected .json or .toml)",
                path.display()
            ))),
        }
    }

    /// Merge two configurations, values of `current` taking precedence
    pub fn merge(mut current: WriterConfiguration, base: WriterConfiguration) -> WriterConfiguration {
        current.merge_with(base);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    #[test]
    fn test_partial_json_is_completed_with_defaults() {
        let config = ConfigLoader::from_json_str(r#"{ "indentSize": 2 }"#).unwrap();
        assert_eq!(config.indent_size(), 2);
        assert_eq!(config.indent_style(), IndentStyle::Spaces);
        assert_eq!(config.aliases().shorten("Org.OData.Core.V1.Description"), "Core.Description");
    }

    #[test]
    fn test_toml_aliases_extend_defaults() {
        let config = ConfigLoader::from_toml_str(
            r#"
indentStyle = "tabs"

[vocabularyAliases]
"com.example.Custom.v1" = "Custom"
"#,
        )
        .unwrap();
        assert_eq!(config.indent_style(), IndentStyle::Tabs);
        let aliases = config.aliases();
        assert!(aliases.is_alias("Custom"));
        assert!(aliases.is_alias("UI"));
    }

    #[test]
    fn test_invalid_configuration() {
        let err = ConfigLoader::from_json_str(r#"{ "indentSize": "wide" }"#).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(ConfigLoader::load(Path::new("does-not-exist.yaml")).is_err());
    }
}
