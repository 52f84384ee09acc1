//! Script Diagnostics
//!
//! Single diagnostic type produced by the macro validator. Designed to be
//! handed to an editor or printed by the CLI without further translation.

use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic codes for categorizing issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    // =========================================================================
    // Registry lookups
    // =========================================================================
    UnknownCommand,

    // =========================================================================
    // Arity
    // =========================================================================
    TooFewArguments,
    TooManyArguments,

    // =========================================================================
    // Per-token checks
    // =========================================================================
    InvalidUnit,
    TypeMismatch,
    InvalidCandidate,
    MalformedReference,
}

impl DiagnosticCode {
    /// Machine-readable tag, e.g. `unknown_command`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown_command",
            Self::TooFewArguments => "too_few_arguments",
            Self::TooManyArguments => "too_many_arguments",
            Self::InvalidUnit => "invalid_unit",
            Self::TypeMismatch => "type_mismatch",
            Self::InvalidCandidate => "invalid_candidate",
            Self::MalformedReference => "malformed_reference",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a diagnostic within one script line.
///
/// Lines and columns are zero-based; columns count characters and
/// `end_col` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl SourceSpan {
    pub fn new(line: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            line,
            start_col,
            end_col,
        }
    }

    /// Span covering an entire line of text
    pub fn whole_line(line: u32, text: &str) -> Self {
        Self::new(line, 0, text.chars().count() as u32)
    }
}

/// A diagnostic message with location and severity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

// =============================================================================
// Convenience Builders
// =============================================================================

/// Warning for a command path missing from the registry
pub fn unknown_command(line: u32, text: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticCode::UnknownCommand,
        "Command not found in registry!",
        SourceSpan::whole_line(line, text),
    )
}

/// Error for a line supplying fewer tokens than required parameters
pub fn too_few_arguments(line: u32, text: &str) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::TooFewArguments,
        "Too few arguments!",
        SourceSpan::whole_line(line, text),
    )
}

/// Error for a line supplying more tokens than declared parameters
pub fn too_many_arguments(line: u32, text: &str) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::TooManyArguments,
        "Too many arguments!",
        SourceSpan::whole_line(line, text),
    )
}

// =============================================================================
// Tests
// =============================================================================
