//! Configuration management for modset
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use modset::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! let assignments = config.build_assignments().expect("Failed to load module sets");
//! println!("{} pages with handlers", assignments.handlers.len());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MODSET__<section>__<key>`
//!
//! Examples:
//! - `MODSET__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `MODSET__REGISTRY__INTERNAL_PAGE_PREFIX=xhr_`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/modset.toml`.
//! This can be overridden using the `MODSET_CONFIG` environment variable.
//! Module sets are declared inline under `[[module_sets]]` or in separate
//! files listed in `registry.module_set_files`.

mod models;
mod sources;
mod validation;

pub use models::{Config, RegistryConfig, ServerConfig};
pub use validation::ValidationError;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dispatch::PageAssignments;
use crate::setup::{self, ModuleSet, ModuleSetManifest};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to read module set file {path}: {source}")]
    ModuleSetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse module set file {path}: {source}")]
    ModuleSetParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`MODSET__*`)
    /// 2. TOML file (default: `config/modset.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (duplicate sources, empty names, self-anchored modules).
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = sources::load()?;
        config.resolve_module_set_files(sources::config_path().parent())?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let base = path.parent().map(Path::to_path_buf);
        let mut config = sources::load_from_sources(path)?;
        config.resolve_module_set_files(base.as_deref())?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Append the sets from `registry.module_set_files` after the inline ones
    fn resolve_module_set_files(&mut self, base: Option<&Path>) -> Result<(), ConfigError> {
        for path in std::mem::take(&mut self.registry.module_set_files) {
            let manifest = sources::load_module_set_file(base, &path)?;
            self.module_sets.push(manifest);
        }
        Ok(())
    }

    /// Register every configured module set and freeze the result
    pub fn build_assignments(&self) -> Result<PageAssignments, ConfigError> {
        validation::validate_module_sets(&self.module_sets)?;
        let sets = self
            .module_sets
            .iter()
            .map(|set: &ModuleSetManifest| set as &dyn ModuleSet);
        Ok(setup::build(sets, &self.registry.internal_page_prefix))
    }
}
