//! Interception session control.
//!
//! A session installs one per-request handler against the host's
//! interception mechanism, evaluates an insertion-ordered rule table per
//! intercepted request (first match wins), and accumulates the resolved mock
//! fields by URL. Sessions are strictly sequential: beginning a new one
//! clears any handler left by a previous one, so rule tables never leak
//! across test steps. Within a session, concurrent interceptions are
//! independent; the accumulation map is the only shared mutable state.

use crate::config::SessionConfig;
use crate::directive::MockDirective;
use crate::error::MockError;
use crate::host::{InterceptHook, InterceptedRoute, RouteHandler};
use crate::rule::MatchRule;
use crate::synth::{synthesize, ResolvedMock};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One rule and the directive it selects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub rule: MatchRule,
    pub directive: MockDirective,
}

/// Insertion-ordered table of (rule, directive) pairs.
///
/// Built once per session, consulted once per intercepted request, discarded
/// with the session. Matching stops at the first rule whose predicates all
/// succeed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: MatchRule, directive: MockDirective) -> Self {
        self.push(rule, directive);
        self
    }

    pub fn push(&mut self, rule: MatchRule, directive: MockDirective) {
        self.entries.push(RuleEntry { rule, directive });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }
}

/// Per-session state shared between the installed handler and the caller.
struct SessionInner {
    table: RuleTable,
    resolved: Mutex<HashMap<String, ResolvedMock>>,
    notify: Notify,
}

#[async_trait]
impl RouteHandler for SessionInner {
    async fn on_route(&self, route: Arc<dyn InterceptedRoute>) {
        let url = route.url();

        for (index, entry) in self.table.iter().enumerate() {
            if !entry.rule.matches(route.as_ref()) {
                continue;
            }

            debug!(url = %url, rule = index, "mocking intercepted request");
            match synthesize(&entry.directive, route.as_ref()).await {
                Ok(mock) => match route.fulfill(&mock).await {
                    Ok(()) => {
                        self.resolved.lock().insert(url, mock);
                        self.notify.notify_waiters();
                    }
                    Err(error) => {
                        warn!(url = %url, %error, "fulfill rejected by host runtime");
                    }
                },
                Err(error) => {
                    warn!(url = %url, %error, "mock synthesis failed, resuming request");
                    if let Err(error) = route.resume().await {
                        warn!(url = %url, %error, "resume failed after synthesis failure");
                    }
                }
            }
            // First match wins; later rules are not evaluated.
            return;
        }

        if let Err(error) = route.resume().await {
            warn!(url = %url, %error, "resume failed for unmatched request");
        }
    }
}

/// A live mock session: handler installed, accumulating results.
pub struct MockSession {
    hook: Arc<dyn InterceptHook>,
    inner: Arc<SessionInner>,
    wait_timeout: Duration,
}

impl MockSession {
    /// Wait until some mocked URL contains `fragment`, bounded by the
    /// configured timeout. Timing out yields `None`, never an error.
    pub async fn wait_for_url(&self, fragment: &str) -> Option<String> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            // Register the waiter before checking, so a notification landing
            // between the check and the await is not lost.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(url) = self.find_resolved(fragment) {
                return Some(url);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                debug!(fragment = %fragment, "bounded wait elapsed without a matching mock");
                return None;
            }
        }
    }

    /// Snapshot of the mocks resolved so far, keyed by matched URL.
    pub fn resolved(&self) -> HashMap<String, ResolvedMock> {
        self.inner.resolved.lock().clone()
    }

    /// Uninstall the handler and return the accumulated URL → mock map.
    pub async fn finish(self) -> Result<HashMap<String, ResolvedMock>, MockError> {
        self.hook.clear().await?;
        let resolved = std::mem::take(&mut *self.inner.resolved.lock());
        info!(mocked = resolved.len(), "mock session finished");
        Ok(resolved)
    }

    fn find_resolved(&self, fragment: &str) -> Option<String> {
        self.inner
            .resolved
            .lock()
            .keys()
            .find(|url| url.contains(fragment))
            .cloned()
    }
}

/// Entry point for running mock sessions against a host runtime.
pub struct SessionController {
    hook: Arc<dyn InterceptHook>,
    config: SessionConfig,
}

impl SessionController {
    pub fn new(hook: Arc<dyn InterceptHook>, config: SessionConfig) -> Self {
        Self { hook, config }
    }

    /// Install `table` and begin a session. Any handler left by a previous
    /// session is cleared first, keeping sessions strictly sequential.
    pub async fn begin(&self, table: RuleTable) -> Result<MockSession, MockError> {
        self.hook.clear().await?;

        let inner = Arc::new(SessionInner {
            table,
            resolved: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        });
        self.hook
            .install(&self.config.route_pattern, inner.clone())
            .await?;
        info!(
            pattern = %self.config.route_pattern,
            rules = inner.table.len(),
            "mock session installed"
        );

        Ok(MockSession {
            hook: self.hook.clone(),
            inner,
            wait_timeout: self.config.wait_timeout(),
        })
    }

    /// Observe, without mocking, the first request whose URL contains
    /// `fragment`: install a resume-everything watcher, run `trigger`, and
    /// wait (bounded) for a matching URL. The watcher is cleared before
    /// returning. Timing out yields `Ok(None)`.
    pub async fn capture_url<F, Fut>(
        &self,
        fragment: &str,
        trigger: F,
    ) -> Result<Option<String>, MockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.hook.clear().await?;

        let watcher = Arc::new(UrlWatcher {
            fragment: fragment.to_string(),
            found: Mutex::new(None),
            notify: Notify::new(),
        });
        self.hook
            .install(&self.config.route_pattern, watcher.clone())
            .await?;

        trigger().await;

        let deadline = Instant::now() + self.config.wait_timeout();
        let url = loop {
            let notified = watcher.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(url) = watcher.found.lock().clone() {
                break Some(url);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                break None;
            }
        };

        self.hook.clear().await?;
        Ok(url)
    }
}

/// Resume-everything handler that records the first URL containing its
/// fragment.
struct UrlWatcher {
    fragment: String,
    found: Mutex<Option<String>>,
    notify: Notify,
}

#[async_trait]
impl RouteHandler for UrlWatcher {
    async fn on_route(&self, route: Arc<dyn InterceptedRoute>) {
        let url = route.url();
        if url.contains(&self.fragment) {
            let mut found = self.found.lock();
            if found.is_none() {
                *found = Some(url.clone());
                self.notify.notify_waiters();
            }
        }
        if let Err(error) = route.resume().await {
            warn!(url = %url, %error, "resume failed while watching urls");
        }
    }
}
