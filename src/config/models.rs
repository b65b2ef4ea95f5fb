use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::registry::DEFAULT_INTERNAL_PREFIX;
use crate::setup::ModuleSetManifest;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Module sets declared inline, registered before `module_set_files`
    #[serde(default)]
    pub module_sets: Vec<ModuleSetManifest>,
}

/// Registry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Pages starting with this prefix are skipped by all-pages modules
    #[serde(default = "default_internal_page_prefix")]
    pub internal_page_prefix: String,
    /// Standalone module set files, registered in listed order
    #[serde(default)]
    pub module_set_files: Vec<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            internal_page_prefix: default_internal_page_prefix(),
            module_set_files: Vec::new(),
        }
    }
}

fn default_internal_page_prefix() -> String {
    DEFAULT_INTERNAL_PREFIX.to_string()
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.registry.internal_page_prefix, "ajax_");
        assert!(config.registry.module_set_files.is_empty());
        assert!(config.module_sets.is_empty());
    }
}
