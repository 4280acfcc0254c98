//! Mock response synthesis.
//!
//! Resolves a [`MockDirective`] into the concrete `{status, headers, body}`
//! that fulfills an interception. Fields the directive leaves open come from
//! the real upstream exchange: the strategy is fetch-per-field with no
//! caching, so one synthesis may fetch upstream several times. That is
//! deliberate and mirrors the host runtimes, which serve repeated fetches of
//! the same interception cheaply.

use crate::directive::{BodyPlan, MockDirective};
use crate::error::MockError;
use crate::host::UpstreamSource;
use crate::patch::apply_edits;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The resolved substitute response, also returned to callers as a
/// diagnostics record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMock {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Build the substitute response for a matched interception.
///
/// Status and headers fall back to the upstream values when the directive
/// does not fix them. The body follows the directive's [`BodyPlan`]:
/// path-based edits always run against the freshly fetched upstream body
/// (and win over a declared full replacement), a full replacement is used
/// verbatim, and otherwise the upstream body passes through.
///
/// An upstream fetch failure or a failing edit aborts synthesis; the caller
/// resumes the request instead of fulfilling it.
pub async fn synthesize<U>(
    directive: &MockDirective,
    upstream: &U,
) -> Result<ResolvedMock, MockError>
where
    U: UpstreamSource + ?Sized,
{
    let status = match directive.status {
        Some(code) => code,
        None => {
            debug!("mock status not declared, using upstream status");
            upstream.fetch().await?.status
        }
    };

    let headers = match directive.headers {
        Some(ref fixed) => fixed.clone(),
        None => {
            debug!("mock headers not declared, using upstream headers");
            upstream.fetch().await?.headers
        }
    };

    let body = match directive.body_plan() {
        BodyPlan::Patch(edits) => {
            debug!(edits = edits.len(), "patching upstream body");
            let actual = upstream.fetch().await?.body;
            apply_edits(&actual, edits)?
        }
        BodyPlan::Full(text) => {
            debug!("replacing body verbatim");
            text.to_string()
        }
        BodyPlan::Passthrough => {
            debug!("mock body not declared, using upstream body");
            upstream.fetch().await?.body
        }
    };

    Ok(ResolvedMock {
        status,
        headers,
        body,
    })
}
