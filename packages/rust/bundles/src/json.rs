//! Language file decoding.
//!
//! Module authors sometimes leave `//` comments in their JSON language
//! files. They are stripped before parsing; `//` inside string values
//! (URLs, mostly) is kept.

use crammese_shared::{Result, TranslationBundle};

/// Remove `//` line comments that appear outside string literals.
pub fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Skip to end of line, keeping the newline itself.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Decode raw language-file bytes into a bundle.
pub fn decode_bundle(origin: &str, bytes: &[u8]) -> Result<TranslationBundle> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    TranslationBundle::from_json_str(origin, &strip_line_comments(text))
}
