//! Alias variables and `{name}` substitution.
//!
//! Aliases are bound by the alias-definition command of a script and
//! referenced elsewhere as `{name}`. The published [`VariableTable`] is
//! replaced wholesale at the end of every validation pass.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Default bound on how deeply alias values may nest
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Where an alias was defined
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub document: String,
    pub line: u32,
    pub column: u32,
}

/// A name to value binding established by an alias definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    /// Raw value, not resolved at bind time
    pub value: String,
    pub location: Location,
}

/// Failure to resolve references in a string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("Unbalanced '}}' at position {position}")]
    UnbalancedBrace { position: usize },

    #[error("Alias '{name}' refers to itself")]
    Cycle { name: String },

    #[error("Alias expansion nested deeper than {limit}")]
    DepthLimit { limit: usize },
}

/// Source of alias values for substitution
pub trait VariableLookup {
    fn value(&self, name: &str) -> Option<&str>;
}

impl VariableLookup for BTreeMap<String, Variable> {
    fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.value.as_str())
    }
}

/// The published alias table
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    variables: BTreeMap<String, Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// All variables in name order
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Replace the whole table
    pub fn publish(&mut self, variables: BTreeMap<String, Variable>) {
        self.variables = variables;
    }

    /// Resolve `{name}` references against this table
    pub fn resolve(&self, text: &str) -> Result<String, SubstitutionError> {
        substitute(text, self, DEFAULT_MAX_DEPTH)
    }
}

impl VariableLookup for VariableTable {
    fn value(&self, name: &str) -> Option<&str> {
        self.variables.value(name)
    }
}

/// Replace `{name}` references in `text` with alias values.
///
/// Braces are matched innermost first, so a reference name may itself be
/// built from references (`{pos{i}}`). A bound value is expanded
/// recursively before it is inserted and scanning resumes after it.
/// Unbound references are left exactly as written.
pub fn substitute(
    text: &str,
    lookup: &impl VariableLookup,
    max_depth: usize,
) -> Result<String, SubstitutionError> {
    let mut expanding = Vec::new();
    expand(text, lookup, max_depth, &mut expanding)
}

/// `expanding` holds the names whose values are being expanded, outermost first
fn expand(
    text: &str,
    lookup: &impl VariableLookup,
    max_depth: usize,
    expanding: &mut Vec<String>,
) -> Result<String, SubstitutionError> {
    let mut out = text.to_string();
    let mut opens: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < out.len() {
        match out.as_bytes()[i] {
            b'{' => opens.push(i),
            b'}' => {
                let start = opens
                    .pop()
                    .ok_or(SubstitutionError::UnbalancedBrace { position: i })?;
                let name = &out[start + 1..i];

                if let Some(value) = lookup.value(name) {
                    if expanding.iter().any(|n| n == name) {
                        return Err(SubstitutionError::Cycle {
                            name: name.to_string(),
                        });
                    }
                    if expanding.len() >= max_depth {
                        return Err(SubstitutionError::DepthLimit { limit: max_depth });
                    }

                    expanding.push(name.to_string());
                    let value = expand(value, lookup, max_depth, expanding)?;
                    expanding.pop();

                    out.replace_range(start..=i, &value);
                    i = start + value.len();
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    Ok(out)
}

/// Best-effort substitution: on failure the input is returned unchanged
pub fn resolve_or_original(
    text: &str,
    lookup: &impl VariableLookup,
    max_depth: usize,
) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    match substitute(text, lookup, max_depth) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Leaving '{}' unresolved: {}", text, e);
            text.to_string()
        }
    }
}
