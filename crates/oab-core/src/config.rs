use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::document::OpenApiVersion;
use crate::error::ConfigError;

/// Top-level project configuration loaded from `.oab.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OabConfig {
    pub openapi: OpenApiVersion,
    pub info: InfoConfig,
    pub servers: Vec<ServerConfig>,
    pub naming: NamingConfig,
}

/// Document info block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Placeholder defaults for `{name}` segments of `url`.
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

/// Schema naming and operation-id options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Derive missing operation ids from method and path.
    pub derive_operation_ids: bool,
}

/// How component schema names are derived from type paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `<module>.<Name>`
    #[default]
    ModuleQualified,
    /// `<Name>`; collisions are still widened to the full module path.
    BareName,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oab.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OabConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: OabConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oab configuration
openapi: 3.1.0        # 2.0 | 3.0.3 | 3.1.0 | 3.2.0

info:
  title: API
  version: 0.1.0
  # description: What this API does

servers: []
  # - url: https://api.example.com/v1
  #   description: production

naming:
  strategy: module_qualified   # module_qualified | bare_name
  derive_operation_ids: false  # GET /items/{id} -> getItem
"#
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = OabConfig::default();
        assert_eq!(config.openapi, OpenApiVersion::V3_1);
        assert_eq!(config.info.title, "API");
        assert_eq!(config.info.version, "0.1.0");
        assert!(config.servers.is_empty());
        assert_eq!(config.naming.strategy, NamingStrategy::ModuleQualified);
        assert!(!config.naming.derive_operation_ids);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
openapi: "2.0"
info:
  title: Pet Store
  version: 1.2.0
  description: Pets and owners
servers:
  - url: https://pets.example.com/v1
    description: production
  - url: https://{stage}.pets.example.com/v1
    variables:
      stage: staging
naming:
  strategy: bare_name
  derive_operation_ids: true
"#;
        let config: OabConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.openapi, OpenApiVersion::V2_0);
        assert_eq!(config.info.title, "Pet Store");
        assert_eq!(config.info.description.as_deref(), Some("Pets and owners"));
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].url, "https://pets.example.com/v1");
        assert!(config.servers[0].variables.is_empty());
        assert_eq!(config.servers[1].variables["stage"], "staging");
        assert_eq!(config.naming.strategy, NamingStrategy::BareName);
        assert!(config.naming.derive_operation_ids);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: OabConfig = serde_yaml_ng::from_str("openapi: 3.0.3\n").unwrap();
        assert_eq!(config.openapi, OpenApiVersion::V3_0);
        // Defaults applied
        assert_eq!(config.info.title, "API");
        assert_eq!(config.naming.strategy, NamingStrategy::ModuleQualified);
    }

    #[test]
    fn test_default_content_parses() {
        let config: OabConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.openapi, OpenApiVersion::V3_1);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_config_reports_path_on_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "naming: [not, a, map]").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
