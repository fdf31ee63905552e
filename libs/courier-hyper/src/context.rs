use crate::config::RequestConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
struct SharedState {
    negotiated_version: Mutex<Option<http::Version>>,
    attributes: Mutex<http::Extensions>,
}

/// Per-call engine context.
///
/// Carries the [`RequestConfig`] of one submission. Clones share the
/// protocol-negotiation state and the attribute bag, so a context reused for
/// follow-up calls keeps what earlier exchanges recorded. The request config
/// itself is per clone.
#[derive(Clone, Default)]
pub struct ClientContext {
    request_config: Option<RequestConfig>,
    shared: Arc<SharedState>,
}

impl ClientContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_config(&self) -> Option<&RequestConfig> {
        self.request_config.as_ref()
    }

    pub fn set_request_config(&mut self, config: RequestConfig) {
        self.request_config = Some(config);
    }

    /// Protocol version of the most recent exchange made with this context.
    #[must_use]
    pub fn negotiated_version(&self) -> Option<http::Version> {
        *self.shared.negotiated_version.lock()
    }

    pub fn record_negotiated_version(&self, version: http::Version) {
        *self.shared.negotiated_version.lock() = Some(version);
    }

    /// Store a typed attribute, returning the previous value of that type.
    pub fn insert_attribute<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.shared.attributes.lock().insert(value)
    }

    #[must_use]
    pub fn attribute<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.shared.attributes.lock().get::<T>().cloned()
    }

    /// Returns `true` if both contexts share negotiation state and attributes.
    #[must_use]
    pub fn shares_state_with(&self, other: &ClientContext) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("request_config", &self.request_config)
            .field("negotiated_version", &self.negotiated_version())
            .finish_non_exhaustive()
    }
}
