//! g4macro-core: command registry and macro validation engine
//!
//! This crate contains the pure engine with NO configuration or
//! filesystem policy:
//! - Command tree (insert, lookup, search, sort, JSON export)
//! - Definition listing reader that populates the tree
//! - Token extraction for macro script lines
//! - Alias variable table and `{name}` substitution
//! - Script validator producing diagnostics
//!
//! Source management, configuration and the CLI live in the `g4macro`
//! crate.

pub mod command;
pub mod diagnostics;
pub mod reader;
pub mod tokens;
pub mod units;
pub mod validator;
pub mod values;
pub mod variables;

// Re-export commonly used types
pub use command::{CommandNode, CommandTree, ParamType, Parameter, PATH_SEPARATOR};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, SourceSpan};
pub use reader::{parse_definitions, read_definitions, DefinitionReader, ReadSummary};
pub use tokens::{command_token, input_parameters, InputParameterToken};
pub use validator::{ValidationOptions, Validator, ALIAS_COMMAND, COMMENT_MARKER};
pub use variables::{
    resolve_or_original, substitute, Location, SubstitutionError, Variable, VariableLookup,
    VariableTable,
};
