//! Pointer-style path translation.
//!
//! External callers address JSON values with slash-delimited pointer paths
//! (the form produced by "Copy JSON Pointer" tooling). The engine walks
//! documents with a dotted/bracketed form instead. Translation is total:
//! any input yields exactly one output, and input that is not in pointer
//! form is passed through untouched.

/// Delimiter between segments of an external pointer path.
pub const EXTERNAL_DELIMITER: char = '/';

/// Prefix that forces a numeric-looking segment to be treated as an object
/// key instead of an array index.
pub const LITERAL_ESCAPE: char = '*';

/// Root marker of the internal dotted form.
pub const ROOT_MARKER: &str = "$";

/// Translate an external pointer path into the internal dotted form.
///
/// `/details/0/data/1/Title` becomes `$.details[0].data[1].Title`.
/// A segment that parses fully as a base-10 integer is emitted as an array
/// index; prefixing it with `*` strips the marker and emits it as an object
/// key (`/details/*0/Title` becomes `$.details.0.Title`). Empty segments
/// from consecutive delimiters are discarded.
///
/// Input that does not start with `/` is returned unchanged, which makes the
/// function idempotent on already-internal paths.
pub fn translate_path(external: &str) -> String {
    if !external.starts_with(EXTERNAL_DELIMITER) {
        return external.to_string();
    }
    let mut internal = String::from(ROOT_MARKER);
    for segment in external.split(EXTERNAL_DELIMITER) {
        if segment.is_empty() {
            continue;
        }
        if segment.parse::<i64>().is_ok() {
            internal.push('[');
            internal.push_str(segment);
            internal.push(']');
        } else {
            let key = segment.strip_prefix(LITERAL_ESCAPE).unwrap_or(segment);
            internal.push('.');
            internal.push_str(key);
        }
    }
    internal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_simple_keys() {
        assert_eq!(translate_path("/a/b"), "$.a.b");
        assert_eq!(translate_path("/details/data/Title"), "$.details.data.Title");
    }

    #[test]
    fn test_translate_numeric_segments_become_indexes() {
        assert_eq!(
            translate_path("/details/0/data/1/Title"),
            "$.details[0].data[1].Title"
        );
    }

    #[test]
    fn test_literal_escape_forces_key_treatment() {
        assert_eq!(
            translate_path("/details/*0/data/1/Title"),
            "$.details.0.data[1].Title"
        );
    }

    #[test]
    fn test_consecutive_delimiters_are_discarded() {
        assert_eq!(translate_path("//a///b/"), "$.a.b");
    }

    #[test]
    fn test_non_pointer_input_passes_through() {
        assert_eq!(translate_path("$.a.b"), "$.a.b");
        assert_eq!(translate_path("a.b"), "a.b");
        assert_eq!(translate_path(""), "");
    }

    #[test]
    fn test_translation_is_idempotent_on_internal_form() {
        let internal = translate_path("/a/0/b");
        assert_eq!(translate_path(&internal), internal);
    }

    #[test]
    fn test_mixed_alphanumeric_segment_is_a_key() {
        // Integer parsing is the sole discriminator; "0x1" and "1a" fail it.
        assert_eq!(translate_path("/a/0x1/1a"), "$.a.0x1.1a");
    }
}
