//! Dispatch adapter behaviour against a recording engine.

mod common;

use common::{RecordingEngine, millis};
use courier_core::{AsyncClient, HttpError, Options, Request};
use courier_hyper::{
    AsyncHyperClient, ClientContext, CloseMode, CompletionHandler, CompletionStrategy,
    ResponseSlotHandler, SimpleResponse,
};
use http::Method;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn get(url: &str) -> Request {
    Request::builder(Method::GET, url).build()
}

fn adapter() -> (Arc<RecordingEngine>, AsyncHyperClient<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::new());
    let client = AsyncHyperClient::with_engine(Arc::clone(&engine));
    (engine, client)
}

/// Delegates to the default handler and counts completions it saw.
struct CountingHandler {
    inner: Box<ResponseSlotHandler>,
    seen: Arc<AtomicUsize>,
}

impl CompletionHandler for CountingHandler {
    fn completed(self: Box<Self>, response: SimpleResponse) {
        self.seen.fetch_add(1, Ordering::SeqCst);
        self.inner.completed(response);
    }

    fn failed(self: Box<Self>, error: HttpError) {
        self.inner.failed(error);
    }

    fn cancelled(self: Box<Self>) {
        self.inner.cancelled();
    }

    fn cancellation(&self) -> Option<CancellationToken> {
        self.inner.cancellation()
    }
}

fn counting_strategy(seen: &Arc<AtomicUsize>) -> CompletionStrategy {
    let seen = Arc::clone(seen);
    CompletionStrategy::new(move |request, slot| {
        Box::new(CountingHandler {
            inner: Box::new(ResponseSlotHandler::new(request, slot)),
            seen: Arc::clone(&seen),
        })
    })
}

#[tokio::test]
async fn execute_returns_before_completion() {
    let (engine, client) = adapter();

    let pending = client
        .execute(get("https://api.example.com/users"), &Options::default(), None)
        .unwrap();
    assert_eq!(engine.submission_count(), 1);

    engine.complete(0, 200, "[]");
    let response = pending.await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "[]");
    assert_eq!(response.request().url(), "https://api.example.com/users");
}

#[tokio::test]
async fn response_headers_are_folded() {
    let (engine, client) = adapter();
    let pending = client
        .execute(get("http://localhost/h"), &Options::default(), None)
        .unwrap();

    engine.complete(0, 200, "");
    let response = pending.await.unwrap();

    assert_eq!(response.headers().get("X-A").unwrap(), ["1", "2"]);
    assert_eq!(response.headers().get("X-B").unwrap(), ["x"]);
    assert!(response.body().is_none());
}

#[tokio::test]
async fn submitted_request_is_translated() {
    let (engine, client) = adapter();
    let request = Request::builder(Method::POST, "http://localhost/upload")
        .header("Content-Length", "999")
        .body_string("hello")
        .build();

    let _pending = client.execute(request, &Options::default(), None).unwrap();

    let submitted = engine.request(0);
    assert_eq!(submitted.method(), Method::POST);
    assert_eq!(submitted.header_values("content-length").count(), 0);
    let accept: Vec<_> = submitted.header_values("accept").collect();
    assert_eq!(accept, ["*/*"]);
    assert_eq!(submitted.body().unwrap().bytes().as_ref(), b"hello");
}

#[tokio::test]
async fn deflate_fails_synchronously_without_submission() {
    let (engine, client) = adapter();
    let request = Request::builder(Method::POST, "http://localhost/")
        .header("Content-Encoding", "DEFLATE")
        .body_string("payload")
        .build();

    let err = client.execute(request, &Options::default(), None).unwrap_err();

    assert!(matches!(err, HttpError::UnsupportedEncoding(_)));
    assert_eq!(engine.submission_count(), 0);
}

#[tokio::test]
async fn invalid_url_fails_synchronously_without_submission() {
    let (engine, client) = adapter();

    let err = client
        .execute(get("no-scheme/path"), &Options::default(), None)
        .unwrap_err();

    assert!(matches!(err, HttpError::InvalidUri { .. }));
    assert_eq!(engine.submission_count(), 0);
}

#[tokio::test]
async fn each_outcome_resolves_exactly_once() {
    let (engine, client) = adapter();
    let options = Options::default();

    let success = client.execute(get("http://localhost/1"), &options, None).unwrap();
    let failure = client.execute(get("http://localhost/2"), &options, None).unwrap();
    let cancelled = client.execute(get("http://localhost/3"), &options, None).unwrap();

    engine.complete(0, 201, "created");
    engine.fail(1, HttpError::Timeout(Duration::from_secs(1)));
    engine.cancel(2);

    assert_eq!(success.await.unwrap().status(), 201);
    assert!(matches!(failure.await, Err(HttpError::Timeout(_))));
    assert!(cancelled.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn late_completion_after_caller_cancel_is_ignored() {
    let (engine, client) = adapter();
    let mut pending = client
        .execute(get("http://localhost/slow"), &Options::default(), None)
        .unwrap();

    assert!(pending.cancel());
    assert!(engine.caller_cancelled(0));

    engine.complete(0, 200, "too late");
    assert!(pending.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn dropping_pending_signals_engine() {
    let (engine, client) = adapter();
    let pending = client
        .execute(get("http://localhost/"), &Options::default(), None)
        .unwrap();

    assert!(!engine.caller_cancelled(0));
    drop(pending);
    assert!(engine.caller_cancelled(0));
}

#[tokio::test]
async fn unsupported_protocol_version_fails_the_call() {
    let (engine, client) = adapter();
    let pending = client
        .execute(get("http://localhost/"), &Options::default(), None)
        .unwrap();

    let response = http::Response::builder()
        .version(http::Version::HTTP_3)
        .status(200)
        .body(bytes::Bytes::new())
        .unwrap();
    engine.complete_with(0, response);

    assert!(matches!(
        pending.await,
        Err(HttpError::UnsupportedProtocolVersion(_))
    ));
}

#[tokio::test]
async fn strategy_swap_does_not_affect_dispatched_call() {
    let (engine, client) = adapter();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    client.set_completion_strategy(counting_strategy(&first));
    let pending = client
        .execute(get("http://localhost/a"), &Options::default(), None)
        .unwrap();

    client.set_completion_strategy(counting_strategy(&second));
    engine.complete(0, 200, "");
    pending.await.unwrap();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);

    let next = client
        .execute(get("http://localhost/b"), &Options::default(), None)
        .unwrap();
    engine.complete(1, 200, "");
    next.await.unwrap();
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn strategy_accessors() {
    let (_engine, client) = adapter();
    let default = client.completion_strategy();
    assert!(Arc::ptr_eq(&default, &client.completion_strategy()));

    client.set_completion_strategy(CompletionStrategy::default_strategy());
    assert!(!Arc::ptr_eq(&default, &client.completion_strategy()));

    client.reset_completion_strategy();
    assert!(Arc::ptr_eq(&default, &client.completion_strategy()));
}

#[tokio::test]
async fn concurrent_calls_keep_their_own_timeouts() {
    let engine = Arc::new(RecordingEngine::new());
    let client = Arc::new(AsyncHyperClient::with_engine(Arc::clone(&engine)));

    let fast = Options::new(millis(100), millis(200), false);
    let slow = Options::new(Duration::from_secs(5), Duration::from_secs(30), true);

    let tasks: Vec<_> = [fast, slow]
        .into_iter()
        .map(|options| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let url = format!("http://localhost/{}", options.read_timeout().as_millis());
                client.execute(get(&url), &options, None).map(drop)
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(engine.submission_count(), 2);
    for index in 0..2 {
        let path = engine.request(index).uri().path().to_owned();
        let config = engine.request_config(index);
        if path == "/200" {
            assert_eq!(config.connect_timeout, millis(100));
            assert_eq!(config.response_timeout, millis(200));
            assert!(!config.redirects_enabled);
        } else {
            assert_eq!(path, "/30000");
            assert_eq!(config.connect_timeout, Duration::from_secs(5));
            assert_eq!(config.response_timeout, Duration::from_secs(30));
            assert!(config.redirects_enabled);
        }
    }
}

#[tokio::test]
async fn caller_context_is_reused_and_reconfigured() {
    let engine = Arc::new(RecordingEngine::with_max_redirects(3));
    let client = AsyncHyperClient::with_engine(Arc::clone(&engine));
    let context = ClientContext::new();

    let options = Options::default().with_read_timeout(Duration::from_secs(2));
    let _pending = client
        .execute(get("http://localhost/"), &options, Some(context.clone()))
        .unwrap();

    let submitted = engine.context(0);
    assert!(submitted.shares_state_with(&context));
    assert!(context.request_config().is_none());

    let config = submitted.request_config().unwrap();
    assert_eq!(config.response_timeout, Duration::from_secs(2));
    assert_eq!(config.max_redirects, 3);
}

#[tokio::test]
async fn configure_timeouts_replaces_previous_config() {
    let (_engine, client) = adapter();
    let first = client.configure_timeouts_and_redirection(
        &Options::default().with_connect_timeout(millis(50)),
        ClientContext::new(),
    );
    let second = client.configure_timeouts_and_redirection(
        &Options::default().with_follow_redirects(false),
        first.clone(),
    );

    assert_eq!(first.request_config().unwrap().connect_timeout, millis(50));
    let config = second.request_config().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
    assert!(!config.redirects_enabled);
    assert_eq!(config.max_redirects, 10);
}

#[tokio::test]
async fn borrowed_engine_is_not_closed() {
    let (engine, client) = adapter();
    assert!(!client.owns_engine());

    client.close().await;

    assert!(client.is_closed());
    assert!(engine.close_calls().is_empty());
}

#[tokio::test]
async fn owned_engine_is_closed_gracefully_once() {
    let engine = Arc::new(RecordingEngine::new());
    let client = AsyncHyperClient::with_owned_engine(Arc::clone(&engine));
    assert!(client.owns_engine());

    client.close().await;
    client.close().await;

    assert_eq!(engine.close_calls(), [CloseMode::Graceful]);
}

#[tokio::test]
async fn execute_after_close_fails_synchronously() {
    let (engine, client) = adapter();
    client.close().await;

    let err = client
        .execute(get("http://localhost/"), &Options::default(), None)
        .unwrap_err();

    assert!(matches!(err, HttpError::Closed));
    assert_eq!(engine.submission_count(), 0);
}

#[tokio::test]
async fn usable_through_async_client_trait() {
    let (engine, client) = adapter();
    let client: &dyn AsyncClient<ClientContext> = &client;

    let pending = client
        .execute(get("http://localhost/"), &Options::default(), None)
        .unwrap();
    engine.complete(0, 204, "");

    assert_eq!(pending.await.unwrap().status(), 204);
}
