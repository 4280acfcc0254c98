//! JSON micro-parser.
//!
//! A scanning value extractor that walks a dotted key path through JSON text
//! by brace/bracket depth counting, without building a parse tree. It powers
//! the read-heavy side of rule matching, where request bodies are probed for
//! the presence of a handful of keys and full deserialization would be
//! wasted work.
//!
//! Absence and malformed input are the same outcome here: `None`. Callers
//! treat "key not found" and "body is not even JSON" identically.

use crate::path::ROOT_MARKER;

/// Return the raw text of the value at `path` inside `json`, or `None`.
///
/// `path` is a dotted key path (`user.profile.name`); a leading `$.` or `$`
/// from the internal path form is tolerated and stripped. Each segment is
/// located by searching for the quoted key literal within the current text
/// window, then the window narrows to the value that follows:
///
/// - objects and arrays are cut out by balanced brace/bracket scanning and
///   become the new window (and are returned verbatim if the path ends
///   there);
/// - a string terminates the walk: on the last segment its unescaped content
///   is returned, otherwise the path tried to navigate into a scalar and the
///   lookup fails;
/// - any other leading character is a number/boolean/null primitive, scanned
///   up to the next delimiter, with the same last-segment rule.
pub fn json_value_at(json: &str, path: &str) -> Option<String> {
    if json.is_empty() || path.is_empty() {
        return None;
    }

    let text = json.trim();
    if !(text.starts_with('{') && text.ends_with('}')) {
        return None;
    }

    let path = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix(ROOT_MARKER))
        .unwrap_or(path);
    if path.is_empty() {
        return None;
    }

    let segments: Vec<&str> = path.split('.').collect();
    let last = segments.len() - 1;
    let mut window = text;

    for (i, key) in segments.iter().enumerate() {
        let needle = format!("\"{key}\"");
        let key_idx = window.find(&needle)?;

        let after_key = &window[key_idx + needle.len()..];
        let colon = after_key.find(':')?;
        let value = after_key[colon + 1..].trim_start();

        match value.chars().next()? {
            '{' => window = balanced_slice(value, '{', '}'),
            '[' => window = balanced_slice(value, '[', ']'),
            '"' => {
                if i == last {
                    return Some(unescape(string_slice(value)));
                }
                // Cannot navigate further into a string value.
                return None;
            }
            _ => {
                if i == last {
                    return Some(primitive_slice(value).to_string());
                }
                return None;
            }
        }
    }

    Some(window.to_string())
}

/// Cut out a balanced `open`..`close` region starting at the first byte of
/// `text`. Returns an empty slice if the region never closes.
fn balanced_slice(text: &str, open: char, close: char) -> &str {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return &text[..=idx];
            }
        }
    }
    ""
}

/// Content of the quoted string starting at the first byte of `text`,
/// without the surrounding quotes. A single-level escape flag keeps `\"`
/// from terminating the scan early. Returns an empty slice if the closing
/// quote is missing.
fn string_slice(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut escaped = false;
    for i in 1..bytes.len() {
        if escaped {
            escaped = false;
        } else if bytes[i] == b'\\' {
            escaped = true;
        } else if bytes[i] == b'"' {
            return &text[1..i];
        }
    }
    ""
}

/// Apply the supported escape substitutions to extracted string content.
fn unescape(raw: &str) -> String {
    raw.replace("\\\"", "\"")
        .replace("\\\\", "\\")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\/", "/")
        .replace("\\b", "\u{0008}")
        .replace("\\f", "\u{000C}")
}

/// Primitive token starting at the first byte of `text`, scanned up to the
/// next `,`, `}`, `]`, whitespace, or end of text.
fn primitive_slice(text: &str) -> &str {
    for (idx, c) in text.char_indices() {
        if c == ',' || c == '}' || c == ']' || c.is_whitespace() {
            return text[..idx].trim();
        }
    }
    text.trim()
}
