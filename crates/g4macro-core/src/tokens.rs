//! Token extraction for macro script lines.
//!
//! A line is split into whitespace-delimited tokens, except that a
//! double-quoted run is a single token. The first token is the command
//! path and is not returned by [`input_parameters`].

use serde::Serialize;

/// One parameter token of a script line.
///
/// Columns are character offsets into the original line; `end_col` is
/// exclusive. For a quoted token the span includes both quotes while
/// `text` does not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputParameterToken {
    pub text: String,
    pub start_col: u32,
    pub end_col: u32,
}

/// The leading whitespace-delimited token of a line (the command path)
pub fn command_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Parameter tokens of `line`, skipping the command itself
pub fn input_parameters(line: &str) -> Vec<InputParameterToken> {
    tokenize(line).into_iter().skip(1).collect()
}

/// All tokens of `line`, command included
pub fn tokenize(line: &str) -> Vec<InputParameterToken> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        if chars[i] == '"' {
            if let Some(offset) = chars[i + 1..].iter().position(|&c| c == '"') {
                let close = i + 1 + offset;
                tokens.push(InputParameterToken {
                    text: chars[i + 1..close].iter().collect(),
                    start_col: start as u32,
                    end_col: (close + 1) as u32,
                });
                i = close + 1;
                continue;
            }
        }

        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(InputParameterToken {
            text: chars[start..i].iter().collect(),
            start_col: start as u32,
            end_col: i as u32,
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(line: &str) -> Vec<String> {
        input_parameters(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_skips_command() {
        assert_eq!(texts("/gun/energy 10 MeV"), vec!["10", "MeV"]);
        assert!(input_parameters("/run/initialize").is_empty());
        assert!(input_parameters("").is_empty());
    }

    #[test]
    fn test_columns() {
        let tokens = input_parameters("/gun/energy   10 MeV");
        assert_eq!(tokens[0].start_col, 14);
        assert_eq!(tokens[0].end_col, 16);
        assert_eq!(tokens[1].start_col, 17);
        assert_eq!(tokens[1].end_col, 20);
    }

    #[test]
    fn test_quoted_token() {
        let tokens = input_parameters(r#"/control/alias name "a b c" x"#);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "a b c");
        assert_eq!(tokens[1].start_col, 20);
        assert_eq!(tokens[1].end_col, 27);
        assert_eq!(tokens[2].text, "x");
    }

    #[test]
    fn test_unterminated_quote_is_plain_run() {
        assert_eq!(texts(r#"/control/echo "abc def"#), vec!["\"abc", "def"]);
    }

    #[test]
    fn test_quote_inside_word() {
        assert_eq!(texts(r#"/control/echo ab"c d""#), vec!["ab\"c", "d\""]);
    }

    #[test]
    fn test_command_token() {
        assert_eq!(command_token("  /run/beamOn 10"), "/run/beamOn");
        assert_eq!(command_token("/run/beamOn\t10"), "/run/beamOn");
        assert_eq!(command_token("   "), "");
    }
}
