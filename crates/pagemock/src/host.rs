//! Host-runtime interfaces.
//!
//! The engine never owns a transport: interception, the real upstream fetch,
//! and fulfillment all belong to the driving browser-automation runtime.
//! These traits are the seams it plugs into. A host adapter implements them
//! once; everything else in this crate is runtime-agnostic.

use crate::error::MockError;
use crate::synth::ResolvedMock;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to one intercepted request.
pub trait InterceptedRequest: Send + Sync {
    /// Full request URL.
    fn url(&self) -> String;

    /// All request headers.
    fn all_headers(&self) -> HashMap<String, String>;

    /// Request body text, if the request carries one.
    fn post_data(&self) -> Option<String>;
}

/// The real network response for an intercepted request.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Access to the real upstream exchange behind an intercepted request.
///
/// Each call performs a fresh fetch; the synthesizer deliberately does not
/// cache across calls, so an implementation is free to as long as repeated
/// calls stay valid for the same interception.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch(&self) -> Result<UpstreamResponse, MockError>;
}

/// One intercepted in-flight request, as handed to the per-request handler.
///
/// Exactly one of [`fulfill`](InterceptedRoute::fulfill) or
/// [`resume`](InterceptedRoute::resume) must complete per interception.
#[async_trait]
pub trait InterceptedRoute: InterceptedRequest + UpstreamSource {
    /// Substitute the response with the resolved mock fields.
    async fn fulfill(&self, mock: &ResolvedMock) -> Result<(), MockError>;

    /// Let the request proceed to the network unmodified.
    async fn resume(&self) -> Result<(), MockError>;
}

/// Per-request callback installed against the host's interception mechanism.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn on_route(&self, route: Arc<dyn InterceptedRoute>);
}

/// The host's request-interception mechanism.
#[async_trait]
pub trait InterceptHook: Send + Sync {
    /// Install `handler` for every request matching `pattern`.
    async fn install(
        &self,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<(), MockError>;

    /// Remove all installed handlers.
    async fn clear(&self) -> Result<(), MockError>;
}
