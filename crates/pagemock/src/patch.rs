//! JSON patch applier.
//!
//! The write-side counterpart of [`crate::scan`]: edits are applied against a
//! full `serde_json` tree rather than by text surgery, so everything outside
//! the targeted key survives byte-for-byte in value terms. One edit changes
//! exactly one key; a batch applies its edits sequentially, each pass
//! re-parsing the previous pass's output, so later edits see earlier ones.

use crate::error::PatchError;
use crate::path::translate_path;
use serde_json::Value;
use tracing::debug;

/// Apply one edit to `json`: replace the value at `path` with `value`.
///
/// `path` may be in external pointer form (`/a/0/b`) or internal dotted form
/// (`$.a[0].b`); it is translated either way. The walk descends all but the
/// last segment to the parent container, resolving `key[index]` segments by
/// numeric index into the array found at that key, then overwrites the final
/// segment with type-directed encoding:
///
/// - an array value is wrapped as a single-element array containing the
///   value's serialized textual form;
/// - an object value is inserted as a nested object;
/// - scalars are inserted as typed scalars.
///
/// A path that does not resolve is fatal for the edit and propagates as a
/// [`PatchError`].
pub fn apply_edit(json: &str, path: &str, value: &Value) -> Result<String, PatchError> {
    let mut doc: Value = serde_json::from_str(json)?;
    let internal = translate_path(path);

    let segments: Vec<&str> = internal.split('.').collect();
    if segments.len() < 2 {
        return Err(PatchError::EmptyPath { path: internal });
    }

    let mut current = &mut doc;
    for segment in &segments[1..segments.len() - 1] {
        current = descend(current, segment, &internal)?;
    }

    let final_segment = segments[segments.len() - 1];
    let (name, index) = split_segment(final_segment);
    let parent = current
        .as_object_mut()
        .ok_or_else(|| PatchError::NotAnObject {
            path: internal.clone(),
            segment: final_segment.to_string(),
        })?;

    match index {
        None => {
            parent.insert(name.to_string(), encode_value(value));
        }
        Some(idx) => {
            let slot = parent
                .get_mut(name)
                .ok_or_else(|| PatchError::MissingSegment {
                    path: internal.clone(),
                    segment: final_segment.to_string(),
                })?
                .as_array_mut()
                .ok_or_else(|| PatchError::NotAnArray {
                    path: internal.clone(),
                    segment: final_segment.to_string(),
                })?
                .get_mut(idx)
                .ok_or_else(|| PatchError::IndexOutOfBounds {
                    path: internal.clone(),
                    segment: final_segment.to_string(),
                    index: idx,
                })?;
            *slot = encode_value(value);
        }
    }

    Ok(serde_json::to_string(&doc)?)
}

/// Apply a batch of edits sequentially, in slice order.
///
/// Slice order is the application order and is caller-significant: edits to
/// aliasing paths (say `/a/b` and `/a`) produce order-dependent results. The
/// first failing edit aborts the whole batch; no partial document is
/// returned.
pub fn apply_edits(json: &str, edits: &[(String, Value)]) -> Result<String, PatchError> {
    let mut current = json.to_string();
    for (path, value) in edits {
        debug!(path = %path, "applying body edit");
        current = apply_edit(&current, path, value)?;
    }
    Ok(current)
}

/// Descend one `key` or `key[index]` segment from `current`.
fn descend<'a>(
    current: &'a mut Value,
    segment: &str,
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    let (name, index) = split_segment(segment);
    let child = current
        .as_object_mut()
        .ok_or_else(|| PatchError::NotAnObject {
            path: path.to_string(),
            segment: segment.to_string(),
        })?
        .get_mut(name)
        .ok_or_else(|| PatchError::MissingSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;

    match index {
        None => Ok(child),
        Some(idx) => child
            .as_array_mut()
            .ok_or_else(|| PatchError::NotAnArray {
                path: path.to_string(),
                segment: segment.to_string(),
            })?
            .get_mut(idx)
            .ok_or_else(|| PatchError::IndexOutOfBounds {
                path: path.to_string(),
                segment: segment.to_string(),
                index: idx,
            }),
    }
}

/// Split a `key[index]` segment into its key and optional index. Segments
/// whose bracket suffix does not parse as an index are literal keys.
fn split_segment(segment: &str) -> (&str, Option<usize>) {
    if let (Some(open), Some(close)) = (segment.find('['), segment.rfind(']')) {
        if open < close {
            if let Ok(idx) = segment[open + 1..close].parse::<usize>() {
                return (&segment[..open], Some(idx));
            }
        }
    }
    (segment, None)
}

/// Type-directed encoding of a replacement value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(vec![Value::String(value.to_string())]),
        other => other.clone(),
    }
}
