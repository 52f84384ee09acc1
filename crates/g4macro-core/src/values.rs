//! Literal checks for typed parameters.

use once_cell::sync::Lazy;
use regex::Regex;

static DOUBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid double regex")
});

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer regex"));

const BOOLEAN_LITERALS: &[&str] = &["true", "false", "TRUE", "FALSE", "1", "0"];

/// Signed decimal or scientific-notation numeral
pub fn is_double(text: &str) -> bool {
    DOUBLE_RE.is_match(text)
}

/// Signed integer numeral
pub fn is_integer(text: &str) -> bool {
    INTEGER_RE.is_match(text)
}

pub fn is_boolean(text: &str) -> bool {
    BOOLEAN_LITERALS.contains(&text)
}
