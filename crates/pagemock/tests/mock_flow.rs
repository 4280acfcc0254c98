//! End-to-end tests for the interception session controller, driven through
//! fake host-runtime implementations.

use async_trait::async_trait;
use pagemock::{
    InterceptHook, InterceptedRequest, InterceptedRoute, MatchRule, MockDirective, MockError,
    ResolvedMock, RouteHandler, RuleTable, SessionConfig, SessionController, UpstreamResponse,
    UpstreamSource,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pagemock=debug")
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Fake host runtime
// ============================================================================

#[derive(Default)]
struct FakeHook {
    handler: Mutex<Option<Arc<dyn RouteHandler>>>,
    installs: AtomicUsize,
    clears: AtomicUsize,
}

impl FakeHook {
    fn installed(&self) -> bool {
        self.handler.lock().is_some()
    }

    async fn deliver(&self, route: Arc<FakeRoute>) {
        let handler = self
            .handler
            .lock()
            .clone()
            .expect("no handler installed on the fake hook");
        handler.on_route(route).await;
    }
}

#[async_trait]
impl InterceptHook for FakeHook {
    async fn install(
        &self,
        _pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<(), MockError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock() = Some(handler);
        Ok(())
    }

    async fn clear(&self) -> Result<(), MockError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock() = None;
        Ok(())
    }
}

struct FakeRoute {
    url: String,
    headers: HashMap<String, String>,
    body: Option<String>,
    upstream: UpstreamResponse,
    fail_fetch: bool,
    fulfilled: Mutex<Option<ResolvedMock>>,
    resumed: AtomicBool,
}

impl FakeRoute {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            headers: HashMap::new(),
            body: None,
            upstream: UpstreamResponse {
                status: 200,
                headers: HashMap::from([(
                    "content-type".to_string(),
                    "application/json".to_string(),
                )]),
                body: r#"{"a":{"b":1,"c":[10,20]}}"#.to_string(),
            },
            fail_fetch: false,
            fulfilled: Mutex::new(None),
            resumed: AtomicBool::new(false),
        }
    }

    fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    fn fulfilled(&self) -> Option<ResolvedMock> {
        self.fulfilled.lock().clone()
    }

    fn resumed(&self) -> bool {
        self.resumed.load(Ordering::SeqCst)
    }
}

impl InterceptedRequest for FakeRoute {
    fn url(&self) -> String {
        self.url.clone()
    }
    fn all_headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }
    fn post_data(&self) -> Option<String> {
        self.body.clone()
    }
}

#[async_trait]
impl UpstreamSource for FakeRoute {
    async fn fetch(&self) -> Result<UpstreamResponse, MockError> {
        if self.fail_fetch {
            return Err(MockError::Upstream("connection refused".to_string()));
        }
        Ok(self.upstream.clone())
    }
}

#[async_trait]
impl InterceptedRoute for FakeRoute {
    async fn fulfill(&self, mock: &ResolvedMock) -> Result<(), MockError> {
        *self.fulfilled.lock() = Some(mock.clone());
        Ok(())
    }

    async fn resume(&self) -> Result<(), MockError> {
        self.resumed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn controller(hook: &Arc<FakeHook>) -> SessionController {
    SessionController::new(hook.clone(), SessionConfig::default())
}

fn short_wait_controller(hook: &Arc<FakeHook>) -> SessionController {
    SessionController::new(
        hook.clone(),
        SessionConfig {
            wait_timeout_ms: 50,
            ..SessionConfig::default()
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_first_match_wins() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new()
        .with_rule(
            MatchRule::new().with_url_substring("example"),
            MockDirective::new()
                .with_status(201)
                .with_headers(HashMap::new())
                .with_body("first"),
        )
        .with_rule(
            MatchRule::new().with_url_substring("example"),
            MockDirective::new()
                .with_status(500)
                .with_headers(HashMap::new())
                .with_body("second"),
        );

    let session = controller(&hook).begin(table).await.unwrap();

    let route = Arc::new(FakeRoute::new("https://example.com/api"));
    hook.deliver(route.clone()).await;

    let mock = route.fulfilled().expect("route should be fulfilled");
    assert_eq!(mock.status, 201);
    assert_eq!(mock.body, "first");
    assert!(!route.resumed());

    let resolved = session.finish().await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved["https://example.com/api"].status, 201);
    assert!(!hook.installed());
}

#[tokio::test]
async fn test_unmatched_request_resumes() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(
        MatchRule::new().with_url_substring("only-this"),
        MockDirective::new().with_status(204),
    );
    let session = controller(&hook).begin(table).await.unwrap();

    let route = Arc::new(FakeRoute::new("https://other.com/api"));
    hook.deliver(route.clone()).await;

    assert!(route.resumed());
    assert!(route.fulfilled().is_none());
    assert!(session.finish().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_noop_rule_lets_everything_through() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(MatchRule::new(), MockDirective::new().with_status(500));
    let session = controller(&hook).begin(table).await.unwrap();

    let route = Arc::new(FakeRoute::new("https://example.com/api"));
    hook.deliver(route.clone()).await;

    assert!(route.resumed());
    assert!(session.finish().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_falls_back_to_resume() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    // Status is left open so synthesis must fetch upstream.
    let table = RuleTable::new().with_rule(
        MatchRule::new().with_url_substring("example"),
        MockDirective::new().with_body("unused"),
    );
    let session = controller(&hook).begin(table).await.unwrap();

    let mut route = FakeRoute::new("https://example.com/api");
    route.fail_fetch = true;
    let route = Arc::new(route);
    hook.deliver(route.clone()).await;

    assert!(route.resumed());
    assert!(route.fulfilled().is_none());
    assert!(session.finish().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_body_predicate_and_patched_response_end_to_end() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(
        MatchRule::new()
            .with_url_substring("example")
            .with_body_path("user.id", Some("42")),
        MockDirective::new().with_body_edit("/a/b", json!(99)),
    );
    let session = controller(&hook).begin(table).await.unwrap();

    // Wrong body value: predicate fails, request passes through.
    let miss = Arc::new(FakeRoute::new("https://example.com/api").with_body(r#"{"user":{"id":"43"}}"#));
    hook.deliver(miss.clone()).await;
    assert!(miss.resumed());

    // Matching body: upstream body is patched in place.
    let hit = Arc::new(FakeRoute::new("https://example.com/api").with_body(r#"{"user":{"id":"42"}}"#));
    hook.deliver(hit.clone()).await;

    let mock = hit.fulfilled().expect("route should be fulfilled");
    assert_eq!(mock.status, 200);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&mock.body).unwrap(),
        json!({"a":{"b":99,"c":[10,20]}})
    );

    session.finish().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_routes_accumulate_independently() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(
        MatchRule::new().with_url_substring("example"),
        MockDirective::new()
            .with_status(200)
            .with_headers(HashMap::new())
            .with_body("mocked"),
    );
    let session = controller(&hook).begin(table).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let hook = hook.clone();
        tasks.push(tokio::spawn(async move {
            let route = Arc::new(FakeRoute::new(&format!("https://example.com/api/{i}")));
            hook.deliver(route.clone()).await;
            assert!(route.fulfilled().is_some());
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let resolved = session.finish().await.unwrap();
    assert_eq!(resolved.len(), 8);
}

#[tokio::test]
async fn test_wait_for_url_sees_a_mock_landing() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(
        MatchRule::new().with_url_substring("orders"),
        MockDirective::new()
            .with_status(200)
            .with_headers(HashMap::new())
            .with_body("{}"),
    );
    let session = controller(&hook).begin(table).await.unwrap();

    let deliver_hook = hook.clone();
    let deliver = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        deliver_hook
            .deliver(Arc::new(FakeRoute::new("https://example.com/orders/7")))
            .await;
    });

    let url = session.wait_for_url("/orders/").await;
    assert_eq!(url.as_deref(), Some("https://example.com/orders/7"));
    deliver.await.unwrap();

    session.finish().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_url_times_out_to_none() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let table = RuleTable::new().with_rule(
        MatchRule::new().with_url_substring("never"),
        MockDirective::new().with_status(200),
    );
    let session = short_wait_controller(&hook).begin(table).await.unwrap();

    assert_eq!(session.wait_for_url("never").await, None);
    session.finish().await.unwrap();
}

#[tokio::test]
async fn test_sessions_are_strictly_sequential() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());
    let controller = controller(&hook);

    let first = controller
        .begin(RuleTable::new().with_rule(
            MatchRule::new().with_url_substring("example"),
            MockDirective::new()
                .with_status(201)
                .with_headers(HashMap::new())
                .with_body("one"),
        ))
        .await
        .unwrap();
    drop(first);

    // Beginning the next session replaces the previous handler even though
    // the first session was never finished.
    let second = controller
        .begin(RuleTable::new().with_rule(
            MatchRule::new().with_url_substring("example"),
            MockDirective::new()
                .with_status(202)
                .with_headers(HashMap::new())
                .with_body("two"),
        ))
        .await
        .unwrap();
    assert_eq!(hook.installs.load(Ordering::SeqCst), 2);

    let route = Arc::new(FakeRoute::new("https://example.com/api"));
    hook.deliver(route.clone()).await;
    assert_eq!(route.fulfilled().unwrap().status, 202);

    second.finish().await.unwrap();
    assert!(!hook.installed());
}

#[tokio::test]
async fn test_capture_url_observes_without_mocking() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());
    let route = Arc::new(FakeRoute::new("https://example.com/search?q=1"));

    let trigger_hook = hook.clone();
    let trigger_route = route.clone();
    let url = controller(&hook)
        .capture_url("/search", move || async move {
            trigger_hook.deliver(trigger_route).await;
        })
        .await
        .unwrap();

    assert_eq!(url.as_deref(), Some("https://example.com/search?q=1"));
    assert!(route.resumed());
    assert!(route.fulfilled().is_none());
    assert!(!hook.installed());
}

#[tokio::test]
async fn test_capture_url_times_out_to_none() {
    init_tracing();
    let hook = Arc::new(FakeHook::default());

    let url = short_wait_controller(&hook)
        .capture_url("/never", || async {})
        .await
        .unwrap();

    assert_eq!(url, None);
    assert!(!hook.installed());
}
