//! Pagemock: declarative request interception and JSON response mocking for
//! driven browsers.
//!
//! The host browser-automation runtime owns navigation, the DOM, and the
//! network; this crate owns the decision of *which* intercepted requests to
//! mock and *what* the substitute response looks like:
//!
//! - [`path`] translates pointer-style JSON paths into the internal form;
//! - [`scan`] probes JSON text for values by balanced-depth scanning;
//! - [`patch`] applies targeted in-place edits to a JSON document;
//! - [`rule`] evaluates request-matching conditions;
//! - [`directive`] and [`synth`] resolve the substitute response;
//! - [`session`] wires it all behind the host's interception hook.

pub mod config;
pub mod directive;
pub mod error;
pub mod host;
pub mod path;
pub mod patch;
pub mod rule;
pub mod scan;
pub mod session;
pub mod synth;

pub use config::SessionConfig;
pub use directive::{BodyPlan, MockDirective};
pub use error::{MockError, PatchError};
pub use host::{
    InterceptHook, InterceptedRequest, InterceptedRoute, RouteHandler, UpstreamResponse,
    UpstreamSource,
};
pub use path::translate_path;
pub use patch::{apply_edit, apply_edits};
pub use rule::{evaluate_match, extract_domain, MatchRule};
pub use scan::json_value_at;
pub use session::{MockSession, RuleEntry, RuleTable, SessionController};
pub use synth::{synthesize, ResolvedMock};
