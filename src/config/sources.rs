use super::models::Config;
use crate::setup::ModuleSetManifest;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "MODSET_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/modset.toml";
const ENV_PREFIX: &str = "MODSET";
const ENV_SEPARATOR: &str = "__";

/// Where the configuration file is expected
///
/// `MODSET_CONFIG` wins over the default `config/modset.toml`.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    load_from_sources(config_path())
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MODSET__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

/// Read one standalone module set file
///
/// Relative paths resolve against `base` (the main config file's directory).
pub fn load_module_set_file(
    base: Option<&Path>,
    path: &Path,
) -> Result<ModuleSetManifest, super::ConfigError> {
    let resolved = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };

    tracing::debug!("Loading module set from: {}", resolved.display());

    let content = std::fs::read_to_string(&resolved).map_err(|source| {
        super::ConfigError::ModuleSetRead {
            path: resolved.clone(),
            source,
        }
    })?;

    ModuleSetManifest::from_toml(&content).map_err(|source| super::ConfigError::ModuleSetParse {
        path: resolved,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.registry.internal_page_prefix, "ajax_");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"

[registry]
internal_page_prefix = "xhr_"
module_set_files = ["modules/imap.toml"]

[[module_sets]]
source = "core"

[[module_sets.steps]]
op = "add"
kind = "handler"
page = "home"
name = "load_user_data"
requires_login = true
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.registry.internal_page_prefix, "xhr_");
        assert_eq!(config.registry.module_set_files.len(), 1);
        assert_eq!(config.module_sets.len(), 1);
        assert_eq!(config.module_sets[0].source, "core");
        assert_eq!(config.module_sets[0].steps.len(), 1);
    }

    #[test]
    fn test_load_module_set_file_relative() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("modules")).unwrap();
        fs::write(
            temp_dir.path().join("modules/imap.toml"),
            r#"
source = "imap"

[[steps]]
op = "delete"
kind = "output"
page = "home"
name = "welcome"
"#,
        )
        .unwrap();

        let manifest =
            load_module_set_file(Some(temp_dir.path()), Path::new("modules/imap.toml")).unwrap();
        assert_eq!(manifest.source, "imap");
        assert_eq!(manifest.steps.len(), 1);
    }

    #[test]
    fn test_load_module_set_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_module_set_file(Some(temp_dir.path()), Path::new("missing.toml"));
        assert!(matches!(
            result,
            Err(crate::config::ConfigError::ModuleSetRead { .. })
        ));
    }
}
