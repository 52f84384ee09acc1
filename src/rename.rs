//! Alias rename support
//!
//! An alias appears in two forms: as the first parameter of the alias
//! command (`/control/alias name value`) and as a `{name}` reference.
//! Renaming rewrites both, line by line.

use g4macro_core::{command_token, input_parameters, COMMENT_MARKER};
use serde::Serialize;

/// Replacement text for one whole line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineEdit {
    /// Zero-based line index
    pub line: u32,
    pub new_text: String,
}

/// Edits renaming alias `old` to `new` in every line of `text`.
///
/// Only lines that actually change produce an edit.
pub fn rename_alias(text: &str, old: &str, new: &str, alias_command: &str) -> Vec<LineEdit> {
    if old.is_empty() || old == new {
        return Vec::new();
    }

    let old_ref = format!("{{{}}}", old);
    let new_ref = format!("{{{}}}", new);

    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let renamed =
                rename_definition(line, old, new, alias_command).replace(&old_ref, &new_ref);
            (renamed != line).then(|| LineEdit {
                line: index as u32,
                new_text: renamed,
            })
        })
        .collect()
}

/// Rewrite the name token of an alias definition line
fn rename_definition(line: &str, old: &str, new: &str, alias_command: &str) -> String {
    let code = code_part(line);
    if command_token(code) != alias_command {
        return line.to_string();
    }

    match input_parameters(code).first() {
        Some(name) if name.text == old => {
            let chars: Vec<char> = line.chars().collect();
            let mut renamed: String = chars[..name.start_col as usize].iter().collect();
            renamed.push_str(new);
            renamed.extend(&chars[name.end_col as usize..]);
            renamed
        }
        _ => line.to_string(),
    }
}

/// Alias name under the cursor at character `column` of `line`, if any.
///
/// Matches a `{name}` reference or the name parameter of an alias
/// definition.
pub fn alias_at(line: &str, column: u32, alias_command: &str) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let column = column as usize;
    if column > chars.len() {
        return None;
    }

    let mut start = column;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = column;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    if start == end {
        return None;
    }

    let word: String = chars[start..end].iter().collect();

    if start > 0 && chars[start - 1] == '{' && chars.get(end) == Some(&'}') {
        return Some(word);
    }

    let code = code_part(line);
    if command_token(code) != alias_command {
        return None;
    }
    input_parameters(code)
        .first()
        .filter(|name| name.start_col as usize == start && name.text == word)
        .map(|_| word)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn code_part(line: &str) -> &str {
    line.split(COMMENT_MARKER).next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use g4macro_core::ALIAS_COMMAND;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = "\
/control/alias energy 5
/gun/energy {energy} MeV
# {energy} in a comment
/control/echo {energy_max} {energy}
/control/alias energy_max 10
";

    #[test]
    fn test_rename_definitions_and_references() {
        let edits = rename_alias(SCRIPT, "energy", "e0", ALIAS_COMMAND);
        assert_eq!(
            edits,
            vec![
                LineEdit {
                    line: 0,
                    new_text: "/control/alias e0 5".to_string(),
                },
                LineEdit {
                    line: 1,
                    new_text: "/gun/energy {e0} MeV".to_string(),
                },
                LineEdit {
                    line: 2,
                    new_text: "# {e0} in a comment".to_string(),
                },
                LineEdit {
                    line: 3,
                    new_text: "/control/echo {energy_max} {e0}".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_rename_noop() {
        assert!(rename_alias(SCRIPT, "energy", "energy", ALIAS_COMMAND).is_empty());
        assert!(rename_alias(SCRIPT, "missing", "x", ALIAS_COMMAND).is_empty());
        assert!(rename_alias(SCRIPT, "", "x", ALIAS_COMMAND).is_empty());
    }

    #[test]
    fn test_rename_keeps_spacing() {
        let edits = rename_alias("/control/alias   a    1", "a", "bb", ALIAS_COMMAND);
        assert_eq!(edits[0].new_text, "/control/alias   bb    1");
    }

    #[test]
    fn test_alias_at_reference() {
        let line = "/gun/energy {energy} MeV";
        assert_eq!(alias_at(line, 13, ALIAS_COMMAND), Some("energy".to_string()));
        assert_eq!(alias_at(line, 19, ALIAS_COMMAND), Some("energy".to_string()));
        assert_eq!(alias_at(line, 22, ALIAS_COMMAND), None);
        assert_eq!(alias_at(line, 100, ALIAS_COMMAND), None);
    }

    #[test]
    fn test_alias_at_definition() {
        let line = "/control/alias energy 5";
        assert_eq!(alias_at(line, 16, ALIAS_COMMAND), Some("energy".to_string()));
        assert_eq!(alias_at(line, 22, ALIAS_COMMAND), None);
        assert_eq!(alias_at("/control/echo energy", 16, ALIAS_COMMAND), None);
    }
}
