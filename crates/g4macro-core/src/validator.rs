//! Macro Script Validator
//!
//! Checks each line of a macro script against the [`CommandTree`]:
//! command lookup, argument count, unit names and typed values. Alias
//! definitions found during a pass are collected and published to the
//! [`VariableTable`] once the pass completes.
//!
//! # Alias visibility
//!
//! By default references are resolved against the table published by
//! the *previous* pass, so an alias defined and used in the same script
//! only resolves from the second pass onwards. With
//! [`ValidationOptions::immediate_aliases`] set, references instead
//! resolve against the definitions seen so far in the current pass, in
//! document order.
//!
//! # Usage
//!
//! ```
//! use g4macro_core::{parse_definitions, CommandTree, ValidationOptions, Validator, VariableTable};
//!
//! let mut tree = CommandTree::new();
//! parse_definitions(
//!     &mut tree,
//!     "Command /run/beamOn\nParameter : numberOfEvent\n Parameter type : i\n",
//! );
//!
//! let options = ValidationOptions::default();
//! let mut variables = VariableTable::new();
//! let diagnostics =
//!     Validator::new(&tree, &options).run(&mut variables, "/run/beamOn ten\n", "run.mac");
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].message, "Parameter is not of type integer!");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{CommandNode, CommandTree, ParamType, Parameter, PATH_SEPARATOR};
use crate::diagnostics::{self, Diagnostic, DiagnosticCode, SourceSpan};
use crate::tokens::{command_token, input_parameters, InputParameterToken};
use crate::units::is_unit;
use crate::values::{is_boolean, is_double, is_integer};
use crate::variables::{substitute, Location, Variable, VariableTable, DEFAULT_MAX_DEPTH};

/// Command whose first two parameters bind an alias name and value
pub const ALIAS_COMMAND: &str = "/control/alias";

/// Marker starting a comment that runs to the end of the line
pub const COMMENT_MARKER: char = '#';

// =============================================================================
// OPTIONS
// =============================================================================

/// Tunable validation behaviour
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Path of the alias-definition command
    pub alias_command: String,
    /// Resolve aliases defined earlier in the same pass
    pub immediate_aliases: bool,
    /// Reject values outside a parameter's declared candidates
    pub check_candidates: bool,
    /// Report unbalanced braces and runaway expansion as warnings
    pub report_malformed_references: bool,
    /// Maximum alias nesting depth while resolving one parameter
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            alias_command: ALIAS_COMMAND.to_string(),
            immediate_aliases: false,
            check_candidates: false,
            report_malformed_references: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// One validation pass configuration over a loaded command tree
pub struct Validator<'a> {
    tree: &'a CommandTree,
    options: &'a ValidationOptions,
}

/// Per-pass mutable state
struct Pass<'v> {
    document: &'v str,
    published: &'v VariableTable,
    pending: BTreeMap<String, Variable>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    pub fn new(tree: &'a CommandTree, options: &'a ValidationOptions) -> Self {
        Self { tree, options }
    }

    /// Validate every line of `text`, then publish the aliases it defines.
    ///
    /// Returns diagnostics in line order. While the tree is still empty
    /// nothing is reported and `variables` is left untouched.
    pub fn run(
        &self,
        variables: &mut VariableTable,
        text: &str,
        document: &str,
    ) -> Vec<Diagnostic> {
        if self.tree.is_empty() {
            debug!("Skipping diagnostics for {}: no commands loaded", document);
            return Vec::new();
        }

        let mut pass = Pass {
            document,
            published: variables,
            pending: BTreeMap::new(),
            diagnostics: Vec::new(),
        };

        for (index, line) in text.lines().enumerate() {
            self.check_line(&mut pass, index as u32, line);
        }

        let Pass {
            pending,
            diagnostics,
            ..
        } = pass;
        variables.publish(pending);
        diagnostics
    }

    fn check_line(&self, pass: &mut Pass<'_>, line_no: u32, line: &str) {
        let code = match line.find(COMMENT_MARKER) {
            Some(idx) => &line[..idx],
            None => line,
        };

        if !code.starts_with(PATH_SEPARATOR) || code.len() <= 1 {
            return;
        }

        let command = match self.tree.lookup(command_token(code)) {
            Some(node) if !node.name.is_empty() => node,
            _ => {
                pass.diagnostics.push(diagnostics::unknown_command(line_no, line));
                return;
            }
        };

        let tokens = input_parameters(code);
        let declared = &command.parameters;

        if tokens.len() < command.required_parameters() {
            pass.diagnostics.push(diagnostics::too_few_arguments(line_no, line));
            return;
        }

        if declared.is_empty() || tokens.is_empty() {
            return;
        }

        if command.path == self.options.alias_command && tokens.len() > 1 {
            bind_alias(pass, line_no, &tokens[0], &tokens[1]);
        }

        if tokens.len() > declared.len() {
            pass.diagnostics.push(diagnostics::too_many_arguments(line_no, line));
            return;
        }

        for (token, parameter) in tokens.iter().zip(declared) {
            self.check_token(pass, line_no, command, token, parameter);
        }
    }

    fn check_token(
        &self,
        pass: &mut Pass<'_>,
        line_no: u32,
        command: &CommandNode,
        token: &InputParameterToken,
        parameter: &Parameter,
    ) {
        let span = SourceSpan::new(line_no, token.start_col, token.end_col);
        let value = self.resolve(pass, span, &token.text);

        if parameter.is_unit() {
            if !is_unit(&value) {
                pass.diagnostics.push(Diagnostic::error(
                    DiagnosticCode::InvalidUnit,
                    "Invalid unit!",
                    span,
                ));
            }
            return;
        }

        let type_ok = match parameter.param_type {
            ParamType::Double => is_double(&value),
            ParamType::Boolean => is_boolean(&value),
            ParamType::Integer => is_integer(&value),
            ParamType::String(_) | ParamType::Untyped => true,
        };

        if !type_ok {
            pass.diagnostics.push(Diagnostic::error(
                DiagnosticCode::TypeMismatch,
                format!(
                    "Parameter is not of type {}!",
                    parameter.param_type.describe()
                ),
                span,
            ));
            return;
        }

        if self.options.check_candidates {
            if let Some(candidates) = &parameter.candidates {
                if !candidates.iter().any(|c| *c == value) {
                    pass.diagnostics.push(Diagnostic::error(
                        DiagnosticCode::InvalidCandidate,
                        format!(
                            "'{}' is not a candidate of parameter '{}' of {}",
                            value, parameter.name, command.path
                        ),
                        span,
                    ));
                }
            }
        }
    }

    /// Substitute aliases in one token, falling back to the raw text
    fn resolve(&self, pass: &mut Pass<'_>, span: SourceSpan, text: &str) -> String {
        if !text.contains('{') {
            return text.to_string();
        }

        let result = if self.options.immediate_aliases {
            substitute(text, &pass.pending, self.options.max_depth)
        } else {
            substitute(text, pass.published, self.options.max_depth)
        };

        match result {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("{}:{}: leaving '{}' unresolved: {}", pass.document, span.line + 1, text, e);
                if self.options.report_malformed_references {
                    pass.diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::MalformedReference,
                        e.to_string(),
                        span,
                    ));
                }
                text.to_string()
            }
        }
    }
}

fn bind_alias(
    pass: &mut Pass<'_>,
    line_no: u32,
    name: &InputParameterToken,
    value: &InputParameterToken,
) {
    debug!("Alias {} = {}", name.text, value.text);
    pass.pending.insert(
        name.text.clone(),
        Variable {
            name: name.text.clone(),
            value: value.text.clone(),
            location: Location {
                document: pass.document.to_string(),
                line: line_no,
                column: name.start_col,
            },
        },
    );
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_definitions;
    use pretty_assertions::assert_eq;

    const LISTING: &str = "\
Command /control/alias
Parameter : aliasName
 Parameter type  : s
 Omittable       : False
Parameter : aliasValue
 Parameter type  : s
 Omittable       : False

Command /control/verbose
Parameter : switch
 Parameter type  : i
 Omittable       : True
 Default value   : 2

Command /run/initialize
Guidance :
Initialize G4 kernel.

Command /run/beamOn
Parameter : numberOfEvent
 Parameter type  : i
 Omittable       : True
Parameter : macroFile
 Parameter type  : s
 Omittable       : True

Command /gun/energy
Parameter : Energy
 Parameter type  : d
 Omittable       : False
Parameter : Unit
 Parameter type  : s
 Omittable       : True
 Default value   : GeV
 Candidates      : eV keV MeV GeV

Command /gun/particle
Parameter : particleName
 Parameter type  : s
 Omittable       : True
 Default value   : geantino
 Candidates      : e- e+ gamma geantino

Command /tracking/storeTrajectory
Parameter : flag
 Parameter type  : b
 Omittable       : True

Command /test/pair
Parameter : p1
 Parameter type  : s
 Omittable       : False
Parameter : p2
 Parameter type  : s
 Omittable       : True
";

    fn tree() -> CommandTree {
        let mut tree = CommandTree::new();
        parse_definitions(&mut tree, LISTING);
        tree.sort_children();
        tree
    }

    fn run_with(
        options: &ValidationOptions,
        variables: &mut VariableTable,
        text: &str,
    ) -> Vec<Diagnostic> {
        let tree = tree();
        Validator::new(&tree, options).run(variables, text, "test.mac")
    }

    fn run(text: &str) -> Vec<Diagnostic> {
        run_with(&ValidationOptions::default(), &mut VariableTable::new(), text)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_valid_script_is_clean() {
        let text = "\
# a comment
/control/verbose 2
/run/initialize
/gun/energy 10 MeV   # trailing comment
/run/beamOn 100
/tracking/storeTrajectory 1

not a command
";
        assert!(run(text).is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let diagnostics = run("/run/beamOff 10 # stop\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_warning());
        assert_eq!(diagnostics[0].code, DiagnosticCode::UnknownCommand);
        assert_eq!(diagnostics[0].span, SourceSpan::new(0, 0, 22));
    }

    #[test]
    fn test_root_and_directories() {
        assert_eq!(run("/ \n").len(), 1);
        assert!(run("/run/\n").is_empty());
        assert!(run("/\n").is_empty());
    }

    #[test]
    fn test_arity() {
        assert_eq!(messages(&run("/test/pair\n")), vec!["Too few arguments!"]);
        assert!(run("/test/pair a\n").is_empty());
        assert!(run("/test/pair a b\n").is_empty());
        assert_eq!(messages(&run("/test/pair a b c\n")), vec!["Too many arguments!"]);
    }

    #[test]
    fn test_too_many_on_parameterless_command_is_not_reported() {
        assert!(run("/run/initialize now\n").is_empty());
    }

    #[test]
    fn test_types() {
        let diagnostics =
            run("/gun/energy abc MeV\n/run/beamOn 3.5\n/tracking/storeTrajectory yes\n");
        assert_eq!(
            messages(&diagnostics),
            vec![
                "Parameter is not of type double!",
                "Parameter is not of type integer!",
                "Parameter is not of type boolean!",
            ]
        );
        assert_eq!(diagnostics[0].span, SourceSpan::new(0, 12, 15));
        assert_eq!(diagnostics[1].span.line, 1);
        assert!(
            run("/gun/energy -3.5e2 keV\n/run/beamOn 42\n/tracking/storeTrajectory TRUE\n")
                .is_empty()
        );
    }

    #[test]
    fn test_units() {
        assert!(run("/gun/energy 1 cm\n").is_empty());
        let diagnostics = run("/gun/energy 1 centimeters\n");
        assert_eq!(messages(&diagnostics), vec!["Invalid unit!"]);
        assert_eq!(diagnostics[0].code, DiagnosticCode::InvalidUnit);
    }

    #[test]
    fn test_alias_visible_on_next_pass_only() {
        let options = ValidationOptions::default();
        let mut variables = VariableTable::new();
        let text = "/control/alias e abc\n/gun/energy {e} MeV\n";

        // `{e}` is still literal during the defining pass
        let first = run_with(&options, &mut variables, text);
        assert_eq!(messages(&first), vec!["Parameter is not of type double!"]);
        assert_eq!(variables.get("e").unwrap().value, "abc");

        let mut variables = VariableTable::new();
        let text = "/control/alias e 12\n/gun/energy {e} MeV\n";
        let first = run_with(&options, &mut variables, text);
        assert_eq!(first.len(), 1);
        let second = run_with(&options, &mut variables, text);
        assert!(second.is_empty());
        let third = run_with(&options, &mut variables, text);
        assert_eq!(second, third);
    }

    #[test]
    fn test_immediate_aliases() {
        let options = ValidationOptions {
            immediate_aliases: true,
            ..Default::default()
        };
        let mut variables = VariableTable::new();
        let text = "/gun/energy {e} MeV\n/control/alias e 12\n/gun/energy {e} MeV\n";
        let diagnostics = run_with(&options, &mut variables, text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].span.line, 0);
    }

    #[test]
    fn test_alias_location_and_quoted_value() {
        let mut variables = VariableTable::new();
        run_with(
            &ValidationOptions::default(),
            &mut variables,
            "\n/control/alias  label \"two words\"\n",
        );
        let label = variables.get("label").unwrap();
        assert_eq!(label.value, "two words");
        assert_eq!(label.location.line, 1);
        assert_eq!(label.location.column, 16);
        assert_eq!(label.location.document, "test.mac");
    }

    #[test]
    fn test_table_is_replaced_each_pass() {
        let options = ValidationOptions::default();
        let mut variables = VariableTable::new();
        run_with(&options, &mut variables, "/control/alias a 1\n");
        run_with(&options, &mut variables, "/control/alias b 2\n");
        assert!(variables.get("a").is_none());
        assert!(variables.get("b").is_some());
    }

    #[test]
    fn test_candidates_checked_when_enabled() {
        let options = ValidationOptions {
            check_candidates: true,
            ..Default::default()
        };
        let mut variables = VariableTable::new();
        assert!(run_with(&options, &mut variables, "/test/pair x\n").is_empty());
        assert!(run_with(&options, &mut variables, "/gun/particle gamma\n").is_empty());

        let diagnostics = run_with(&options, &mut variables, "/gun/particle proton\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::InvalidCandidate);
        assert_eq!(diagnostics[0].span, SourceSpan::new(0, 14, 20));
        assert!(run("/gun/particle proton\n").is_empty());
        // Unit parameters are checked against the unit table, not candidates
        assert!(run_with(&options, &mut variables, "/gun/energy 1 TeV\n").is_empty());
    }

    #[test]
    fn test_malformed_reference_reporting() {
        let mut variables = VariableTable::new();
        let quiet = run_with(&ValidationOptions::default(), &mut variables, "/test/pair a}\n");
        assert!(quiet.is_empty());

        let options = ValidationOptions {
            report_malformed_references: true,
            ..Default::default()
        };
        let loud = run_with(&options, &mut variables, "/test/pair {a}}\n");
        assert_eq!(loud.len(), 1);
        assert_eq!(loud[0].code, DiagnosticCode::MalformedReference);
        assert_eq!(loud[0].span, SourceSpan::new(0, 11, 15));
    }

    #[test]
    fn test_empty_tree_reports_nothing() {
        let empty = CommandTree::new();
        let options = ValidationOptions::default();
        let mut variables = VariableTable::new();
        let diagnostics = Validator::new(&empty, &options).run(
            &mut variables,
            "/control/alias x 1\n/nope\n",
            "a.mac",
        );
        assert!(diagnostics.is_empty());
        assert!(variables.is_empty());
    }
}
