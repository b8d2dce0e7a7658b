//! Terminal output helpers.

use std::fmt::Write;

use colored::Colorize;

/// Prints `value` as pretty JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", highlight_json(&json));
}

/// Colors a pretty-printed JSON document.
#[must_use]
pub fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                let mut literal = String::from('"');
                let mut escaped = false;
                for next in chars.by_ref() {
                    literal.push(next);
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == '"' {
                        break;
                    }
                }
                let is_key = chars.clone().find(|c| !c.is_whitespace()) == Some(':');
                let colored = if is_key { literal.cyan() } else { literal.green() };
                let _ = write!(out, "{colored}");
            }
            '{' | '}' | '[' | ']' => {
                let _ = write!(out, "{}", ch.to_string().white().bold());
            }
            ':' | ',' => out.push(ch),
            c if c.is_whitespace() => out.push(c),
            c => {
                let mut scalar = String::from(c);
                while let Some(&next) = chars.peek() {
                    if matches!(next, ',' | '}' | ']') || next.is_whitespace() {
                        break;
                    }
                    scalar.push(next);
                    chars.next();
                }
                let colored = match scalar.as_str() {
                    "true" | "false" | "null" => scalar.magenta(),
                    _ => scalar.yellow(),
                };
                let _ = write!(out, "{colored}");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_keeps_text_intact() {
        colored::control::set_override(false);
        let json = "{\n  \"lastUpdate\": \"2024-05-01\",\n  \"size\": 12,\n  \"ok\": true\n}";
        assert_eq!(highlight_json(json), json);
    }

    #[test]
    fn test_highlight_handles_escaped_quotes() {
        colored::control::set_override(false);
        let json = r#"{"title": "The \"Pillars\"", "list": [1, null]}"#;
        assert_eq!(highlight_json(json), json);
    }
}
