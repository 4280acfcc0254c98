//! Mock directives.
//!
//! A [`MockDirective`] declares how the substitute response is built: fixed
//! status/headers, and one of three body plans. The body plan is resolved
//! once per synthesis into the tagged [`BodyPlan`] variant instead of being
//! re-sniffed from nullable fields at each use site.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declarative description of the substitute response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockDirective {
    /// Fixed status code; upstream status when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Fixed header mapping; upstream headers when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Full-body replacement text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Ordered path → replacement-value edits applied to the real upstream
    /// body. When present, these win over `body` (see [`BodyPlan`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_edits: Option<Vec<(String, Value)>>,
}

/// How the substitute body is computed, resolved once per synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPlan<'a> {
    /// Fetch the upstream body and apply the edits in order.
    Patch(&'a [(String, Value)]),
    /// Use the declared text verbatim.
    Full(&'a str),
    /// Use the upstream body unmodified.
    Passthrough,
}

impl MockDirective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Replace the entire response body with `body`.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Queue a path-based edit against the real upstream body. Edits apply
    /// in the order they were added.
    pub fn with_body_edit(mut self, path: impl Into<String>, value: Value) -> Self {
        self.body_edits
            .get_or_insert_with(Vec::new)
            .push((path.into(), value));
        self
    }

    /// Resolve the body plan.
    ///
    /// Path-based edits take precedence over a full replacement when both
    /// are declared; the full replacement only applies when no edits exist.
    /// This precedence is preserved from the original behavior as-is.
    pub fn body_plan(&self) -> BodyPlan<'_> {
        if let Some(ref edits) = self.body_edits {
            return BodyPlan::Patch(edits);
        }
        if let Some(ref body) = self.body {
            return BodyPlan::Full(body);
        }
        BodyPlan::Passthrough
    }
}
