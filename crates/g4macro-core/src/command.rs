//! Command Tree
//!
//! The registry of UI commands known to the toolkit, addressed by
//! slash-delimited paths such as `/run/beamOn`. Each node owns its
//! children; the synthetic root has an empty name and path.
//!
//! Insertion at an exact path replaces whatever node was there, while
//! intermediate directories are created on demand and reused by later
//! insertions under the same prefix. Loading several definition sources
//! in order therefore lets a later source override an earlier one.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '/';

// =============================================================================
// PARAMETERS
// =============================================================================

/// Declared type of a command parameter, as listed by its type code
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParamType {
    /// `d`
    Double,
    /// `b`
    Boolean,
    /// `i`
    Integer,
    /// Any other non-empty code (usually `s`)
    String(String),
    /// No type line was given
    #[default]
    Untyped,
}

impl ParamType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "" => Self::Untyped,
            "d" => Self::Double,
            "b" => Self::Boolean,
            "i" => Self::Integer,
            other => Self::String(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Double => "d",
            Self::Boolean => "b",
            Self::Integer => "i",
            Self::String(code) => code,
            Self::Untyped => "",
        }
    }

    /// Human-readable name used in type diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::String(_) | Self::Untyped => "string",
        }
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One declared argument of a command
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub omittable: bool,
    pub default: String,
    /// Permitted literal values; `None` means unconstrained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether this parameter is the physical unit of a preceding value
    pub fn is_unit(&self) -> bool {
        self.name.eq_ignore_ascii_case("unit")
    }
}

// =============================================================================
// NODES
// =============================================================================

/// One command or command directory
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommandNode {
    /// Last path segment
    #[serde(rename = "command")]
    pub name: String,
    #[serde(skip)]
    pub path: String,
    pub guidance: String,
    pub parameters: Vec<Parameter>,
    /// Owned children in insertion order until [`CommandTree::sort_children`]
    #[serde(serialize_with = "serialize_children")]
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// A node is a directory iff it has at least one child
    pub fn is_directory(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut CommandNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Number of leading parameters before the first omittable one
    pub fn required_parameters(&self) -> usize {
        self.parameters.iter().take_while(|p| !p.omittable).count()
    }

    fn search<'a>(&'a self, term: &str, results: &mut Vec<&'a CommandNode>) {
        for child in &self.children {
            if child.is_directory() {
                child.search(term, results);
            } else if child.path.contains(term) {
                results.push(child);
            }
        }
    }

    fn sort_children(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort_children();
        }
    }

    fn count(&self) -> usize {
        self.children.iter().map(|c| 1 + c.count()).sum()
    }
}

fn serialize_children<S: Serializer>(
    children: &[CommandNode],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(children.len()))?;
    for child in children {
        map.serialize_entry(&child.name, child)?;
    }
    map.end()
}

// =============================================================================
// TREE
// =============================================================================

/// Rooted command registry
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandTree {
    root: CommandNode,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The synthetic `/` node
    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// True until at least one command or directory has been inserted
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Number of nodes below the root
    pub fn len(&self) -> usize {
        self.root.count()
    }

    /// Insert `node` at `path`, creating intermediate directories.
    ///
    /// With `None`, only the missing segments are created (a bare leaf
    /// for a new path). With `Some`, the node replaces any existing
    /// node at exactly that path, children included.
    pub fn insert(&mut self, path: &str, node: Option<CommandNode>) {
        if !path.starts_with(PATH_SEPARATOR) {
            warn!("Ignoring command path without leading '/': {}", path);
            return;
        }

        let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        if segments.last() == Some(&"") {
            segments.pop();
        }

        let mut node = node;
        let mut current = &mut self.root;

        for i in 1..segments.len() {
            let segment = segments[i];

            if i == segments.len() - 1 {
                if let Some(mut replacement) = node.take() {
                    replacement.name = segment.to_string();
                    match current.children.iter().position(|c| c.name == segment) {
                        Some(idx) => current.children[idx] = replacement,
                        None => current.children.push(replacement),
                    }
                    return;
                }
            }

            let idx = match current.children.iter().position(|c| c.name == segment) {
                Some(idx) => idx,
                None => {
                    debug!("Creating new command {}", segment);
                    current
                        .children
                        .push(CommandNode::new(segment, segments[..=i].join("/")));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }
    }

    /// Find the node at `path`.
    ///
    /// `/` yields the root itself, whose empty name marks it as "not a
    /// command". Paths not starting with `/` never match.
    pub fn lookup(&self, path: &str) -> Option<&CommandNode> {
        let mut current = &self.root;
        for segment in split_path(path)? {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn lookup_mut(&mut self, path: &str) -> Option<&mut CommandNode> {
        let mut current = &mut self.root;
        for segment in split_path(path)? {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Children of the node at `path`, or an empty slice when it is missing
    pub fn children(&self, path: &str) -> &[CommandNode] {
        self.lookup(path)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Leaf commands whose full path contains `term`.
    ///
    /// Directories are descended into but never matched themselves.
    pub fn search(&self, term: &str) -> Vec<&CommandNode> {
        let mut results = Vec::new();
        self.root.search(term, &mut results);
        results
    }

    /// Reorder every children list by segment name, recursively
    pub fn sort_children(&mut self) {
        self.root.sort_children();
    }

    /// Export the tree in the `{command, guidance, parameters, children}` shape
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix(PATH_SEPARATOR)?;
    let mut segments: Vec<&str> = rest.split(PATH_SEPARATOR).collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    Some(segments)
}

// =============================================================================
// Tests
// =============================================================================
