//! Request-matching rules.
//!
//! A [`MatchRule`] carries three independently optional predicate sets: URL
//! substrings, required headers, and required body key paths. A rule matches
//! a request only when every predicate across all present sets holds
//! (AND-of-ANDs); evaluation short-circuits on the first failing predicate.
//! A rule with no predicate sets at all never matches anything.

use crate::host::InterceptedRequest;
use crate::scan::json_value_at;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Conditions under which an intercepted request is mocked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    /// Every entry must be a literal substring of the request URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_substrings: Option<Vec<String>>,

    /// Every named header must be present with exactly this value. Value
    /// comparison is case-sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Every key path must resolve in the request body. A `None` expected
    /// value is an existence-only check; a `Some` value must string-equal
    /// the extracted value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_paths: Option<Vec<(String, Option<String>)>>,
}

impl MatchRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `fragment` to appear in the request URL.
    pub fn with_url_substring(mut self, fragment: impl Into<String>) -> Self {
        self.url_substrings
            .get_or_insert_with(Vec::new)
            .push(fragment.into());
        self
    }

    /// Require header `name` to carry exactly `value`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Require the body to contain `path`, optionally with an exact value.
    pub fn with_body_path(
        mut self,
        path: impl Into<String>,
        expected: Option<impl Into<String>>,
    ) -> Self {
        self.body_paths
            .get_or_insert_with(Vec::new)
            .push((path.into(), expected.map(Into::into)));
        self
    }

    /// Evaluate this rule against one intercepted request.
    pub fn matches<R: InterceptedRequest + ?Sized>(&self, request: &R) -> bool {
        // A rule with no predicate sets is an explicit no-op: never matches.
        if self.url_substrings.is_none() && self.headers.is_none() && self.body_paths.is_none() {
            return false;
        }

        if let Some(ref fragments) = self.url_substrings {
            let url = request.url();
            for fragment in fragments {
                if !url.contains(fragment.as_str()) {
                    trace!(url = %url, fragment = %fragment, "url predicate failed");
                    return false;
                }
            }
        }

        if let Some(ref expected_headers) = self.headers {
            let actual = request.all_headers();
            for (name, expected) in expected_headers {
                match actual.get(name) {
                    Some(value) if value == expected => {}
                    _ => {
                        trace!(header = %name, "header predicate failed");
                        return false;
                    }
                }
            }
        }

        if let Some(ref body_paths) = self.body_paths {
            let Some(body) = request.post_data() else {
                return false;
            };
            for (path, expected) in body_paths {
                let Some(found) = json_value_at(&body, path) else {
                    trace!(path = %path, "body key absent");
                    return false;
                };
                if let Some(expected) = expected {
                    if &found != expected {
                        trace!(path = %path, found = %found, "body value predicate failed");
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Evaluate `rule` against `request`. Free-function form of
/// [`MatchRule::matches`].
pub fn evaluate_match<R: InterceptedRequest + ?Sized>(rule: &MatchRule, request: &R) -> bool {
    rule.matches(request)
}

/// Strip scheme, port, path, and query from a URL, leaving only the host.
/// Blank input yields an empty string.
pub fn extract_domain(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut domain = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    if let Some(idx) = domain.find('/') {
        domain = &domain[..idx];
    }
    if let Some(idx) = domain.find(':') {
        domain = &domain[..idx];
    }
    domain.to_string()
}
