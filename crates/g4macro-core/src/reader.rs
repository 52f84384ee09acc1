//! Definition listing reader.
//!
//! Reads the text listing the toolkit prints for its command tree and
//! inserts every directory and command it declares into a
//! [`CommandTree`]. The format is line oriented and stateful:
//!
//! ```text
//! Command directory path : /gun/
//!
//! Guidance :
//! Particle Gun control commands.
//!
//!  Sub-directories :
//!  Commands :
//!   energy * Set kinetic energy.
//!
//! Command /gun/energy
//! Guidance :
//! Set kinetic energy.
//!
//! Parameter : Energy
//!  Parameter type  : d
//!  Omittable       : False
//! ```
//!
//! Nodes are inserted as soon as their path line is read and filled in by
//! the lines that follow. Unrecognized lines are ignored; the reader never
//! fails on content.

use std::io::BufRead;

use tracing::debug;

use crate::command::{CommandNode, CommandTree, ParamType, Parameter, PATH_SEPARATOR};

const DIRECTORY_MARKER: &str = "Command directory path : ";
const COMMAND_MARKER: &str = "Command /";
const GUIDANCE_MARKER: &str = "Guidance :";
const SUBDIRECTORIES_MARKER: &str = " Sub-directories :";
const PARAMETER_MARKER: &str = "Parameter :";

const PARAMETER_TYPE_KEY: &str = " Parameter type";
const OMITTABLE_KEY: &str = " Omittable";
const DEFAULT_VALUE_KEY: &str = " Default value";
const CANDIDATES_KEY: &str = " Candidates";

const KEY_VALUE_SEPARATOR: &str = " : ";

/// Counts reported once a source has been fully read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub lines: usize,
    pub directories: usize,
    pub commands: usize,
    pub parameters: usize,
}

/// Line-by-line state machine over one definition source
#[derive(Debug, Default)]
pub struct DefinitionReader {
    /// Path of the node receiving guidance and parameters
    current: Option<String>,
    reading_guidance: bool,
    reading_parameter: bool,
    summary: ReadSummary,
}

impl DefinitionReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line, updating `tree`
    pub fn feed_line(&mut self, tree: &mut CommandTree, line: &str) {
        self.summary.lines += 1;

        if let Some(path) = line.strip_prefix(DIRECTORY_MARKER) {
            self.begin_node(tree, path, true);
        } else if line.starts_with(COMMAND_MARKER) {
            // keep the leading '/'
            self.begin_node(tree, &line[COMMAND_MARKER.len() - 1..], false);
        } else if let Some(rest) = line.strip_prefix(PARAMETER_MARKER) {
            self.reading_parameter = true;
            self.reading_guidance = false;

            let name = rest.strip_prefix(' ').unwrap_or(rest);
            if let Some(node) = self.current_node(tree) {
                node.parameters.push(Parameter::new(name));
                self.summary.parameters += 1;
            }
        } else if line.starts_with(SUBDIRECTORIES_MARKER) {
            self.reading_guidance = false;
            self.reading_parameter = false;
        } else if line.starts_with(GUIDANCE_MARKER) {
            self.reading_guidance = true;
            self.reading_parameter = false;
        } else if self.reading_parameter {
            if let Some(param) = self
                .current_node(tree)
                .and_then(|node| node.parameters.last_mut())
            {
                apply_parameter_field(param, line);
            }
        } else if self.reading_guidance {
            if let Some(node) = self.current_node(tree) {
                if !node.guidance.is_empty() {
                    node.guidance.push('\n');
                }
                node.guidance.push_str(line);
            }
        }
    }

    /// Signal end of input and report what was read
    pub fn finish(self) -> ReadSummary {
        self.summary
    }

    fn begin_node(&mut self, tree: &mut CommandTree, path: &str, directory: bool) {
        self.reading_guidance = false;
        self.reading_parameter = false;

        let path = path.trim_end();
        let name = path
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .last()
            .unwrap_or("");

        if name.is_empty() {
            // The root listing carries no node of its own
            self.current = None;
            return;
        }

        if directory {
            self.summary.directories += 1;
        } else {
            self.summary.commands += 1;
        }

        debug!("Read definition {}", path);
        tree.insert(path, Some(CommandNode::new(name, path)));
        self.current = Some(path.to_string());
    }

    fn current_node<'t>(&self, tree: &'t mut CommandTree) -> Option<&'t mut CommandNode> {
        tree.lookup_mut(self.current.as_deref()?)
    }
}

/// Fill one field of `param` from a ` Key : value` line
fn apply_parameter_field(param: &mut Parameter, line: &str) {
    let Some((_, value)) = line.split_once(KEY_VALUE_SEPARATOR) else {
        return;
    };

    if line.starts_with(PARAMETER_TYPE_KEY) {
        param.param_type = ParamType::from_code(value);
    } else if line.starts_with(OMITTABLE_KEY) {
        param.omittable = value.trim() == "True";
    } else if line.starts_with(DEFAULT_VALUE_KEY) {
        param.default = value.to_string();
    } else if line.starts_with(CANDIDATES_KEY) {
        let candidates: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        if !candidates.is_empty() {
            param.candidates = Some(candidates);
        }
    }
}

/// Read a whole listing from `reader` into `tree`
pub fn read_definitions<R: BufRead>(
    tree: &mut CommandTree,
    reader: R,
) -> std::io::Result<ReadSummary> {
    let mut definitions = DefinitionReader::new();
    for line in reader.lines() {
        definitions.feed_line(tree, &line?);
    }
    Ok(definitions.finish())
}

/// Read a listing held in memory into `tree`
pub fn parse_definitions(tree: &mut CommandTree, text: &str) -> ReadSummary {
    let mut definitions = DefinitionReader::new();
    for line in text.lines() {
        definitions.feed_line(tree, line);
    }
    definitions.finish()
}
