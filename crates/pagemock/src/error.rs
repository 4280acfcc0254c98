//! Error types for the mocking engine.

/// Errors raised while applying a path-based edit to a JSON document.
///
/// These are fatal for the edit that raised them: the patch applier assumes
/// well-formed documents and resolvable paths, and a batch aborts on the
/// first failing edit rather than returning a partially edited document.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("path `{path}` has no key segments")]
    EmptyPath { path: String },
    #[error("segment `{segment}` of path `{path}` not found")]
    MissingSegment { path: String, segment: String },
    #[error("segment `{segment}` of path `{path}` is not an object")]
    NotAnObject { path: String, segment: String },
    #[error("segment `{segment}` of path `{path}` is not an array")]
    NotAnArray { path: String, segment: String },
    #[error("index {index} out of bounds at segment `{segment}` of path `{path}`")]
    IndexOutOfBounds {
        path: String,
        segment: String,
        index: usize,
    },
}

/// Errors raised while matching, synthesizing, or fulfilling a mock.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// The real upstream fetch for an intercepted request failed. The
    /// interception falls back to resuming the request unmodified.
    #[error("upstream fetch failed: {0}")]
    Upstream(String),
    /// A declared body edit could not be applied to the upstream body.
    #[error(transparent)]
    Patch(#[from] PatchError),
    /// The host runtime rejected an install/clear/fulfill/resume call.
    #[error("interception hook failure: {0}")]
    Hook(String),
}
