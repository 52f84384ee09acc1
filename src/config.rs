//! Configuration loader
//!
//! Loads the registry configuration from a YAML file:
//!
//! ```yaml
//! command_files:
//!   - /opt/geant4/app_commands.txt
//! additional_commands:
//!   - /myApp/setup
//! validation:
//!   immediate_aliases: false
//!   check_candidates: true
//! ```
//!
//! The configuration is read-only here; registry mutations only change
//! the in-memory copy.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use g4macro_core::{ValidationOptions, PATH_SEPARATOR};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RegistryError;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "G4MACRO_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "g4macro.yaml";

/// Registry configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// User definition sources, parsed after the builtin one in this order
    pub command_files: Vec<PathBuf>,
    /// Ad hoc command paths inserted after all sources
    pub additional_commands: Vec<String>,
    pub validation: ValidationOptions,
}

pub struct ConfigLoader {
    path: PathBuf,
    required: bool,
}

impl ConfigLoader {
    /// Loader for an explicit file, which must exist
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// Create loader from G4MACRO_CONFIG or default to ./g4macro.yaml
    ///
    /// The default file is optional: when it is missing, defaults are used.
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::new(path),
            Err(_) => Self {
                path: PathBuf::from(DEFAULT_CONFIG_FILE),
                required: false,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<RegistryConfig> {
        if !self.required && !self.path.exists() {
            info!(
                "No configuration at {}, using defaults",
                self.path.display()
            );
            return Ok(RegistryConfig::default());
        }

        info!("Loading configuration from {}", self.path.display());

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let mut config: RegistryConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        self.validate(&config)?;
        self.resolve_relative_paths(&mut config);

        info!(
            "Loaded {} command files and {} additional commands",
            config.command_files.len(),
            config.additional_commands.len()
        );

        Ok(config)
    }

    fn validate(&self, config: &RegistryConfig) -> Result<(), RegistryError> {
        if let Some(bad) = config
            .additional_commands
            .iter()
            .find(|c| !c.starts_with(PATH_SEPARATOR))
        {
            return Err(RegistryError::Config {
                path: self.path.clone(),
                message: format!("additional command '{}' must start with '/'", bad),
            });
        }

        if !config
            .validation
            .alias_command
            .starts_with(PATH_SEPARATOR)
        {
            return Err(RegistryError::Config {
                path: self.path.clone(),
                message: format!(
                    "alias command '{}' must start with '/'",
                    config.validation.alias_command
                ),
            });
        }

        Ok(())
    }

    /// Command files are relative to the configuration file's directory
    fn resolve_relative_paths(&self, config: &mut RegistryConfig) {
        let Some(base) = self.path.parent() else {
            return;
        };
        for file in &mut config.command_files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }
}
