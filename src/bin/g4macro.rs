//! Geant4 macro command line interface
//!
//! Checks macro files against the command registry and browses the
//! registered command tree.
//!
//! # Usage
//!
//! ```bash
//! # Check macros, with an application's own command listing
//! g4macro --commands app_commands.txt check run.mac vis.mac
//!
//! # Describe a command
//! g4macro lookup /gun/energy
//!
//! # Dump the whole tree as JSON
//! g4macro --format json tree > commands.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use g4macro::{CommandNode, ConfigLoader, Diagnostic, Registry, Severity};

#[derive(Parser)]
#[command(name = "g4macro")]
#[command(version = "0.1.0")]
#[command(about = "Command registry and diagnostics for Geant4 macro files")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Configuration file (defaults to ./g4macro.yaml when present)
    #[arg(long, short, global = true, env = "G4MACRO_CONFIG")]
    config: Option<PathBuf>,

    /// Extra command listing, read after the configured ones (repeatable)
    #[arg(long = "commands", short = 'C', global = true)]
    commands: Vec<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Report diagnostics for macro files
    Check {
        /// Macro files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Validation passes per file; aliases resolve from the second pass
        #[arg(long, default_value_t = 2)]
        passes: usize,
    },

    /// Show a command's guidance and parameters
    Lookup {
        /// Full command path, e.g. /run/beamOn
        path: String,
    },

    /// List commands whose path contains a term
    Search { term: String },

    /// List the children of a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print the command tree (as JSON with `--format json`)
    Tree,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "g4macro=warn,g4macro_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = build_registry(cli.config, cli.commands).and_then(|mut registry| {
        match cli.command {
            Commands::Check { files, passes } => {
                cmd_check(&mut registry, &files, passes, cli.format)
            }
            Commands::Lookup { path } => cmd_lookup(&registry, &path, cli.format),
            Commands::Search { term } => cmd_search(&registry, &term, cli.format),
            Commands::Ls { path } => cmd_ls(&registry, &path, cli.format),
            Commands::Tree => cmd_tree(&registry, cli.format),
        }
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": e }));
            } else {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn build_registry(config: Option<PathBuf>, commands: Vec<PathBuf>) -> Result<Registry, String> {
    let loader = match config {
        Some(path) => ConfigLoader::new(path),
        None => ConfigLoader::from_env(),
    };
    tracing::debug!("Configuration file: {}", loader.path().display());
    let mut config = loader.load().map_err(|e| format!("{:#}", e))?;
    config.command_files.extend(commands);
    Ok(Registry::new(config))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

struct FileReport {
    file: String,
    text: String,
    diagnostics: Vec<Diagnostic>,
}

fn cmd_check(
    registry: &mut Registry,
    files: &[PathBuf],
    passes: usize,
    format: OutputFormat,
) -> Result<(), String> {
    let mut reports = Vec::new();

    for path in files {
        let text = read_file(path)?;
        let document = path.display().to_string();

        let mut diagnostics = Vec::new();
        for _ in 0..passes.max(1) {
            diagnostics = registry.run_diagnostics(&text, &document);
        }

        reports.push(FileReport {
            file: document,
            text,
            diagnostics,
        });
    }

    let all = || reports.iter().flat_map(|r| &r.diagnostics);
    let errors = all().filter(|d| d.is_error()).count();
    let warnings = all().filter(|d| d.is_warning()).count();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": errors == 0,
                "errors": errors,
                "warnings": warnings,
                "files": reports.iter().map(|r| serde_json::json!({
                    "file": r.file,
                    "diagnostics": r.diagnostics,
                })).collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
        OutputFormat::Text => {
            for report in &reports {
                for d in &report.diagnostics {
                    println!(
                        "{}:{}:{}: {}[{}]: {}",
                        report.file,
                        d.span.line + 1,
                        d.span.start_col + 1,
                        d.severity,
                        d.code,
                        d.message
                    );
                }
            }
        }
        OutputFormat::Pretty => {
            for report in &reports {
                let lines: Vec<&str> = report.text.lines().collect();
                for d in &report.diagnostics {
                    print_pretty(&report.file, &lines, d);
                }
            }
            if errors == 0 && warnings == 0 {
                println!("{} {} file(s) checked", "OK".green().bold(), reports.len());
            } else {
                println!("{} error(s), {} warning(s)", errors, warnings);
            }
        }
    }

    if errors > 0 {
        Err(format!("{} error(s) found", errors))
    } else {
        Ok(())
    }
}

fn cmd_lookup(registry: &Registry, path: &str, format: OutputFormat) -> Result<(), String> {
    let node = registry
        .lookup(path)
        .filter(|node| !node.name.is_empty())
        .ok_or_else(|| format!("Command not found: {}", path))?;

    match format {
        OutputFormat::Json => print_json(node)?,
        OutputFormat::Text | OutputFormat::Pretty => {
            println!("{}", node.path.cyan().bold());
            for line in node.guidance.lines() {
                println!("  {}", line);
            }
            if !node.parameters.is_empty() {
                println!();
                println!("{}", "Parameters:".bold());
            }
            for p in &node.parameters {
                let mut detail = p.param_type.describe().to_string();
                if p.omittable {
                    detail.push_str(&format!(", omittable, default '{}'", p.default));
                }
                println!("  {} ({})", p.name.green(), detail);
                if let Some(candidates) = &p.candidates {
                    println!("      candidates: {}", candidates.join(" "));
                }
            }
            for child in &node.children {
                println!("  {}", display_name(child));
            }
        }
    }

    Ok(())
}

fn cmd_search(registry: &Registry, term: &str, format: OutputFormat) -> Result<(), String> {
    let results = registry.search(term);

    match format {
        OutputFormat::Json => {
            let paths: Vec<&str> = results.iter().map(|n| n.path.as_str()).collect();
            print_json(&paths)?;
        }
        OutputFormat::Text => {
            for node in &results {
                println!("{}", node.path);
            }
        }
        OutputFormat::Pretty => {
            for node in &results {
                let summary = node.guidance.lines().next().unwrap_or("");
                println!("{}  {}", node.path.green(), summary.dimmed());
            }
            println!("{} match(es)", results.len());
        }
    }

    Ok(())
}

fn cmd_ls(registry: &Registry, path: &str, format: OutputFormat) -> Result<(), String> {
    if registry.lookup(path).is_none() {
        return Err(format!("No such directory: {}", path));
    }
    let children = registry.children(path);

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = children
                .iter()
                .map(|c| serde_json::json!({ "name": c.name, "directory": c.is_directory() }))
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            for child in children {
                println!("{}", display_name(child));
            }
        }
    }

    Ok(())
}

fn cmd_tree(registry: &Registry, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Json => {
            let json = registry
                .to_json()
                .map_err(|e| format!("JSON serialization failed: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            let tree = registry.tree();
            for child in &tree.root().children {
                print_node(child, 0);
            }
            println!("{} node(s)", tree.len());
        }
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("JSON serialization failed: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn display_name(node: &CommandNode) -> String {
    if node.is_directory() {
        format!("{}/", node.name).cyan().to_string()
    } else {
        node.name.clone()
    }
}

fn print_node(node: &CommandNode, depth: usize) {
    println!("{}{}", "  ".repeat(depth), display_name(node));
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

/// Print one diagnostic with its source line and a caret underline
fn print_pretty(file: &str, lines: &[&str], d: &Diagnostic) {
    let label = match d.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    println!("{}[{}]: {}", label, d.code, d.message.bold());
    println!(
        "  {} {}:{}:{}",
        "-->".blue(),
        file,
        d.span.line + 1,
        d.span.start_col + 1
    );

    if let Some(source) = lines.get(d.span.line as usize) {
        let width = d.span.end_col.saturating_sub(d.span.start_col).max(1) as usize;
        println!("   {} {}", "|".blue(), source);
        println!(
            "   {} {}{}",
            "|".blue(),
            " ".repeat(d.span.start_col as usize),
            "^".repeat(width).red()
        );
    }
    println!();
}
