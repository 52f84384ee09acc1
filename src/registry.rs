//! Command registry service
//!
//! Owns the command tree built from every configured definition source
//! and the alias table published by the last diagnostics pass. A refresh
//! always discards the tree and parses all sources again, in order: the
//! primary source, then the configured command files, then the ad hoc
//! commands. Later sources override earlier ones path by path.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use g4macro_core::{
    command_token, parse_definitions, read_definitions, resolve_or_original, CommandNode,
    CommandTree, Diagnostic, DiagnosticCode, ReadSummary, Validator, Variable, VariableTable,
    COMMENT_MARKER,
};
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::rename::{rename_alias, LineEdit};

/// Listing of the toolkit's standard commands, always parsed first by default
pub const BUILTIN_COMMANDS: &str = include_str!("../data/builtin_commands.txt");

// =============================================================================
// SOURCES
// =============================================================================

/// Where a definition listing comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionSource {
    /// The bundled [`BUILTIN_COMMANDS`] listing
    Builtin,
    File(PathBuf),
    /// In-memory listing, mostly for tests and embedding
    Text { name: String, text: String },
}

impl DefinitionSource {
    pub fn name(&self) -> String {
        match self {
            Self::Builtin => "<builtin>".to_string(),
            Self::File(path) => path.display().to_string(),
            Self::Text { name, .. } => name.clone(),
        }
    }

    /// Parse this source into `tree`
    pub fn read_into(&self, tree: &mut CommandTree) -> RegistryResult<ReadSummary> {
        match self {
            Self::Builtin => Ok(parse_definitions(tree, BUILTIN_COMMANDS)),
            Self::Text { text, .. } => Ok(parse_definitions(tree, text)),
            Self::File(path) => {
                let source_error = |source: std::io::Error| RegistryError::Source {
                    path: path.clone(),
                    source,
                };
                let file = File::open(path).map_err(source_error)?;
                read_definitions(tree, BufReader::new(file)).map_err(source_error)
            }
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Outcome of one full refresh
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Sources parsed successfully
    pub sources: usize,
    /// Names of sources that could not be read
    pub failed: Vec<String>,
    /// Command declarations read across all sources
    pub commands: usize,
    /// Nodes in the resulting tree
    pub nodes: usize,
}

/// Callback run after every refresh
pub type RefreshListener = Box<dyn FnMut(&RefreshSummary) + Send>;

pub struct Registry {
    primary: DefinitionSource,
    config: RegistryConfig,
    tree: CommandTree,
    variables: VariableTable,
    ready: bool,
    listeners: Vec<RefreshListener>,
}

impl Registry {
    /// Registry over the builtin listing plus `config`, loaded immediately
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_primary(DefinitionSource::Builtin, config)
    }

    pub fn with_primary(primary: DefinitionSource, config: RegistryConfig) -> Self {
        let mut registry = Self {
            primary,
            config,
            tree: CommandTree::new(),
            variables: VariableTable::new(),
            ready: false,
            listeners: Vec::new(),
        };
        registry.refresh();
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// True once every source has been read and the tree sorted
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Run `listener` after every subsequent refresh
    pub fn subscribe(&mut self, listener: RefreshListener) {
        self.listeners.push(listener);
    }

    /// Discard the tree and rebuild it from all sources
    pub fn refresh(&mut self) -> RefreshSummary {
        self.ready = false;

        let mut tree = CommandTree::new();
        let mut summary = RefreshSummary::default();

        let sources = std::iter::once(self.primary.clone()).chain(
            self.config
                .command_files
                .iter()
                .cloned()
                .map(DefinitionSource::File),
        );

        for source in sources {
            info!("Processing commands from {}", source.name());
            match source.read_into(&mut tree) {
                Ok(read) => {
                    summary.sources += 1;
                    summary.commands += read.commands;
                }
                Err(e) => {
                    warn!("Skipping definition source: {}", e);
                    summary.failed.push(source.name());
                }
            }
        }

        for command in &self.config.additional_commands {
            tree.insert(command, None);
        }

        tree.sort_children();
        summary.nodes = tree.len();

        self.tree = tree;
        self.ready = true;

        info!(
            "Commands refreshed: {} sources, {} failed, {} nodes",
            summary.sources,
            summary.failed.len(),
            summary.nodes
        );

        for listener in &mut self.listeners {
            listener(&summary);
        }

        summary
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn lookup(&self, path: &str) -> Option<&CommandNode> {
        self.tree.lookup(path)
    }

    /// The command named at the start of a script line
    pub fn command_at(&self, line: &str) -> Option<&CommandNode> {
        self.tree
            .lookup(command_token(line))
            .filter(|node| !node.name.is_empty())
    }

    pub fn children(&self, path: &str) -> &[CommandNode] {
        self.tree.children(path)
    }

    pub fn search(&self, term: &str) -> Vec<&CommandNode> {
        self.tree.search(term)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Substitute the published aliases into `text`, best effort
    pub fn resolve(&self, text: &str) -> String {
        resolve_or_original(text, &self.variables, self.config.validation.max_depth)
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(self.tree.to_json()?)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a bare command now and keep it across refreshes.
    ///
    /// Returns false for paths that do not start with `/`.
    pub fn add_command(&mut self, path: &str) -> bool {
        if !path.starts_with('/') {
            warn!("Not adding command '{}': path must start with '/'", path);
            return false;
        }

        self.tree.insert(path, None);
        self.tree.sort_children();

        if !self.config.additional_commands.iter().any(|c| c == path) {
            self.config.additional_commands.push(path.to_string());
        }
        true
    }

    /// Append command files not already configured, then refresh
    pub fn add_command_files<I, P>(&mut self, paths: I) -> RefreshSummary
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            let path = path.into();
            if !self.config.command_files.contains(&path) {
                self.config.command_files.push(path);
            }
        }
        self.refresh()
    }

    /// Drop a configured command file and refresh.
    ///
    /// Returns `None` when the file was not configured.
    pub fn remove_command_file(&mut self, path: &Path) -> Option<RefreshSummary> {
        let index = self.config.command_files.iter().position(|p| p == path)?;
        self.config.command_files.remove(index);
        Some(self.refresh())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate a macro document and publish the aliases it defines
    pub fn run_diagnostics(&mut self, text: &str, document: &str) -> Vec<Diagnostic> {
        if !self.ready {
            return Vec::new();
        }
        Validator::new(&self.tree, &self.config.validation).run(&mut self.variables, text, document)
    }

    /// Edits renaming alias `old` to `new` throughout `text`
    pub fn rename_alias(&self, text: &str, old: &str, new: &str) -> Vec<LineEdit> {
        rename_alias(text, old, new, &self.config.validation.alias_command)
    }
}

/// Command paths reported as unknown, in order of first appearance.
///
/// These are the candidates for [`Registry::add_command`].
pub fn unknown_commands(diagnostics: &[Diagnostic], text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut commands: Vec<String> = Vec::new();

    for diagnostic in diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnknownCommand)
    {
        let Some(line) = lines.get(diagnostic.span.line as usize) else {
            continue;
        };
        let code = line.split(COMMENT_MARKER).next().unwrap_or("");
        let command = command_token(code);
        if !command.is_empty() && !commands.iter().any(|c| c == command) {
            commands.push(command.to_string());
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn text_source(text: &str) -> DefinitionSource {
        DefinitionSource::Text {
            name: "test".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_builtin_registry_is_ready_and_sorted() {
        let registry = Registry::new(RegistryConfig::default());
        assert!(registry.is_ready());

        let top: Vec<&str> = registry.children("/").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(top, vec!["control", "event", "gun", "random", "run", "tracking"]);

        let alias = registry.lookup("/control/alias").unwrap();
        assert_eq!(alias.parameters.len(), 2);
        assert!(alias.guidance.starts_with("Set an alias."));
    }

    #[test]
    fn test_additional_commands_survive_refresh() {
        let mut registry =
            Registry::with_primary(text_source("Command /a/b\n"), RegistryConfig::default());
        assert!(registry.add_command("/my/app/run"));
        assert!(!registry.add_command("my/app/run"));
        assert!(registry.add_command("/my/app/run"));
        assert_eq!(registry.config().additional_commands, vec!["/my/app/run".to_string()]);

        registry.refresh();
        let node = registry.lookup("/my/app/run").unwrap();
        assert!(!node.is_directory());
        assert!(node.parameters.is_empty());
    }

    #[test]
    fn test_missing_file_is_reported_not_fatal() {
        let config = RegistryConfig {
            command_files: vec![PathBuf::from("/nonexistent/commands.txt")],
            ..Default::default()
        };
        let mut registry = Registry::new(config);
        let summary = registry.refresh();
        assert_eq!(summary.sources, 1);
        assert_eq!(summary.failed, vec!["/nonexistent/commands.txt".to_string()]);
        assert!(registry.lookup("/run/beamOn").is_some());
    }

    #[test]
    fn test_listeners_are_notified() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let mut registry = Registry::new(RegistryConfig::default());
        registry.subscribe(Box::new(move |summary| {
            assert!(summary.nodes > 0);
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        registry.refresh();
        let summary = registry.refresh();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.tree().len(), summary.nodes);
    }

    #[test]
    fn test_diagnostics_publish_variables() {
        let mut registry = Registry::new(RegistryConfig::default());
        let text = "/control/alias energy 5\n/gun/energy {energy} MeV\n";

        assert_eq!(registry.run_diagnostics(text, "run.mac").len(), 1);
        assert_eq!(registry.variable("energy").unwrap().value, "5");
        assert_eq!(registry.resolve("{energy} MeV"), "5 MeV");
        assert!(registry.run_diagnostics(text, "run.mac").is_empty());
        assert_eq!(registry.variables().count(), 1);
    }

    #[test]
    fn test_repeated_alias_references_resolve() {
        let mut registry = Registry::new(RegistryConfig::default());
        let text = format!("/control/alias z 1\n/gun/direction {} 0 0\n", "{z}".repeat(70));

        registry.run_diagnostics(&text, "many.mac");
        assert!(registry.run_diagnostics(&text, "many.mac").is_empty());
        assert_eq!(registry.resolve("{z}{z}{z}"), "111");
    }

    #[test]
    fn test_unknown_commands() {
        let mut registry = Registry::new(RegistryConfig::default());
        let text = "/my/cmd 1 # note\n/run/beamOn 1\n/my/cmd 2\n/other\n";
        let diagnostics = registry.run_diagnostics(text, "a.mac");
        assert_eq!(
            unknown_commands(&diagnostics, text),
            vec!["/my/cmd".to_string(), "/other".to_string()]
        );

        registry.add_command("/my/cmd");
        let diagnostics = registry.run_diagnostics(text, "a.mac");
        assert_eq!(unknown_commands(&diagnostics, text), vec!["/other".to_string()]);
    }

    #[test]
    fn test_command_at_line() {
        let registry = Registry::new(RegistryConfig::default());
        assert_eq!(registry.command_at("/gun/energy 1 MeV").unwrap().name, "energy");
        assert!(registry.command_at("/ 1").is_none());
        assert!(registry.command_at("gun/energy").is_none());
    }
}
