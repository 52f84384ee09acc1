//! g4macro: command registry and diagnostics for Geant4 UI macro files
//!
//! The engine (command tree, definition reader, tokenizer, alias
//! substitution, validator) lives in `g4macro-core`. This crate adds:
//! - Definition sources, including the bundled builtin listing
//! - The [`Registry`] service that refreshes and queries the tree
//! - YAML configuration loading
//! - Alias rename support
//! - The `g4macro` CLI (feature `cli`)
//!
//! ```
//! use g4macro::{Registry, RegistryConfig};
//!
//! let mut registry = Registry::new(RegistryConfig::default());
//! let diagnostics = registry.run_diagnostics("/run/beamOn ten\n", "run.mac");
//! assert_eq!(diagnostics.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod rename;

pub use config::{ConfigLoader, RegistryConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
pub use error::{RegistryError, RegistryResult};
pub use registry::{
    unknown_commands, DefinitionSource, RefreshListener, RefreshSummary, Registry,
    BUILTIN_COMMANDS,
};
pub use rename::{alias_at, rename_alias, LineEdit};

// Engine types used through the registry API
pub use g4macro_core::{
    CommandNode, CommandTree, Diagnostic, DiagnosticCode, ParamType, Parameter, Severity,
    SourceSpan, ValidationOptions, Variable,
};
