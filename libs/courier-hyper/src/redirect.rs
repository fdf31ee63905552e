//! Redirect policy applied by the hyper engine
//!
//! - stops after `max_redirects` hops and returns the last 3xx response
//! - refuses `https` to `http` hops unless the config allows downgrades
//! - strips credentials once the chain leaves the original origin

use crate::config::RedirectConfig;
use http::{Request, Uri, header};
use tower_http::follow_redirect::policy::{Action, Attempt, Policy};

/// Headers removed on cross-origin hops
const SENSITIVE_HEADERS: &[header::HeaderName] = &[
    header::AUTHORIZATION,
    header::COOKIE,
    header::PROXY_AUTHORIZATION,
];

/// Per-request redirect policy. A fresh value is built for every exchange.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    config: RedirectConfig,
    max_redirects: usize,
    followed: usize,
    left_origin: bool,
}

impl RedirectPolicy {
    #[must_use]
    pub fn new(config: RedirectConfig, max_redirects: usize) -> Self {
        Self {
            config,
            max_redirects,
            followed: 0,
            left_origin: false,
        }
    }

    /// Scheme, host and port all match. A missing scheme counts as `https`.
    fn same_origin(from: &Uri, to: &Uri) -> bool {
        let from_scheme = from.scheme_str().unwrap_or("https");
        let to_scheme = to.scheme_str().unwrap_or("https");
        from_scheme == to_scheme
            && from.host() == to.host()
            && port_or_default(from, from_scheme) == port_or_default(to, to_scheme)
    }

    fn is_downgrade(from: &Uri, to: &Uri) -> bool {
        from.scheme_str() == Some("https") && to.scheme_str() == Some("http")
    }
}

fn port_or_default(uri: &Uri, scheme: &str) -> u16 {
    uri.port_u16().unwrap_or(match scheme {
        "http" => 80,
        "https" => 443,
        _ => 0,
    })
}

impl<B: Clone, E> Policy<B, E> for RedirectPolicy {
    fn redirect(&mut self, attempt: &Attempt<'_>) -> Result<Action, E> {
        if self.followed >= self.max_redirects {
            tracing::debug!(max = self.max_redirects, "redirect limit reached");
            return Ok(Action::Stop);
        }

        let from = attempt.previous();
        let to = attempt.location();

        if !self.config.allow_https_downgrade && Self::is_downgrade(from, to) {
            tracing::warn!(from = %from, to = %to, "refusing https to http redirect");
            return Ok(Action::Stop);
        }

        if !Self::same_origin(from, to) {
            self.left_origin = true;
        }
        self.followed += 1;
        tracing::debug!(status = attempt.status().as_u16(), to = %to, "following redirect");
        Ok(Action::Follow)
    }

    fn on_request(&mut self, request: &mut Request<B>) {
        if self.left_origin && self.config.strip_sensitive_headers {
            let headers = request.headers_mut();
            for name in SENSITIVE_HEADERS {
                if headers.remove(name).is_some() {
                    tracing::debug!(header = %name, "stripped header on cross-origin redirect");
                }
            }
        }
    }

    // 307/308 resend the body
    fn clone_body(&self, body: &B) -> Option<B> {
        Some(body.clone())
    }
}
