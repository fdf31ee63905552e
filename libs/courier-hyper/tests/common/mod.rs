#![allow(dead_code)]

//! Shared fixtures for courier-hyper integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use courier_core::HttpError;
use courier_hyper::{
    AsyncEngine, ClientContext, CloseMode, CompletionHandler, RequestConfig, SimpleRequest,
    SimpleResponse,
};
use parking_lot::Mutex;
use std::time::Duration;

/// Submission captured by [`RecordingEngine`].
pub struct Submission {
    pub request: SimpleRequest,
    pub context: ClientContext,
    pub handler: Option<Box<dyn CompletionHandler>>,
}

/// Engine that records submissions and completes them only when told to.
#[derive(Default)]
pub struct RecordingEngine {
    submissions: Mutex<Vec<Submission>>,
    closes: Mutex<Vec<CloseMode>>,
    defaults: Option<RequestConfig>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose default request config has the given redirect limit.
    pub fn with_max_redirects(max_redirects: usize) -> Self {
        Self {
            defaults: Some(RequestConfig {
                max_redirects,
                ..RequestConfig::default()
            }),
            ..Self::default()
        }
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    pub fn request(&self, index: usize) -> SimpleRequest {
        self.submissions.lock()[index].request.clone()
    }

    pub fn context(&self, index: usize) -> ClientContext {
        self.submissions.lock()[index].context.clone()
    }

    pub fn request_config(&self, index: usize) -> RequestConfig {
        self.context(index)
            .request_config()
            .cloned()
            .expect("submission carries a request config")
    }

    pub fn close_calls(&self) -> Vec<CloseMode> {
        self.closes.lock().clone()
    }

    fn take_handler(&self, index: usize) -> Box<dyn CompletionHandler> {
        self.submissions.lock()[index]
            .handler
            .take()
            .expect("handler already invoked")
    }

    pub fn complete(&self, index: usize, status: u16, body: &'static str) {
        let response = http::Response::builder()
            .status(status)
            .header("X-A", "1")
            .header("X-A", "2")
            .header("X-B", "x")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        self.complete_with(index, response);
    }

    pub fn complete_with(&self, index: usize, response: SimpleResponse) {
        self.take_handler(index).completed(response);
    }

    pub fn fail(&self, index: usize, error: HttpError) {
        self.take_handler(index).failed(error);
    }

    pub fn cancel(&self, index: usize) {
        self.take_handler(index).cancelled();
    }

    /// Whether the caller has signalled cancellation to this submission.
    pub fn caller_cancelled(&self, index: usize) -> bool {
        self.submissions.lock()[index]
            .handler
            .as_ref()
            .and_then(|handler| handler.cancellation())
            .is_some_and(|token| token.is_cancelled())
    }
}

#[async_trait]
impl AsyncEngine for RecordingEngine {
    fn start(&self) -> Result<(), HttpError> {
        Ok(())
    }

    fn submit(
        &self,
        request: SimpleRequest,
        context: ClientContext,
        handler: Box<dyn CompletionHandler>,
    ) {
        self.submissions.lock().push(Submission {
            request,
            context,
            handler: Some(handler),
        });
    }

    async fn close(&self, mode: CloseMode) {
        self.closes.lock().push(mode);
    }

    fn default_request_config(&self) -> Option<RequestConfig> {
        self.defaults.clone()
    }
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
