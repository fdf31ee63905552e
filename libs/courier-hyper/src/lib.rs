#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Asynchronous courier transport over hyper
//!
//! [`AsyncHyperClient`] implements [`courier_core::AsyncClient`] on top of an
//! [`AsyncEngine`]. The bundled [`HyperEngine`] runs exchanges on a pooled
//! hyper-util client with rustls, per-call timeouts and redirect following.
//!
//! A call goes through four pieces:
//! - [`to_simple_request`] turns the core request into a [`SimpleRequest`]
//! - a [`CompletionStrategy`] builds the handler bound to the caller's
//!   [`PendingResponse`](courier_core::PendingResponse)
//! - the engine performs the exchange and reports to the handler
//! - [`to_response`] turns the engine response back into a core response
//!
//! # Example
//!
//! ```ignore
//! use courier_core::{Options, Request};
//! use courier_hyper::{AsyncHyperClient, HyperEngine};
//! use std::time::Duration;
//!
//! let client = AsyncHyperClient::from_builder(
//!     HyperEngine::builder().user_agent("inventory-sync/1.0"),
//! )?;
//!
//! let request = Request::builder(http::Method::POST, "https://api.example.com/items")
//!     .header("Content-Encoding", "gzip")
//!     .json(&item)?
//!     .build();
//! let options = Options::default().with_read_timeout(Duration::from_secs(5));
//!
//! let response = client.execute(request, &options, None)?.await?;
//! client.close().await;
//! ```

mod builder;
mod client;
mod config;
mod connector;
mod context;
mod engine;
mod hyper_engine;
mod native;
mod redirect;
mod request;
mod response;
mod strategy;
pub mod tls;

pub use builder::HyperEngineBuilder;
pub use client::AsyncHyperClient;
pub use config::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, HyperEngineConfig,
    RedirectConfig, RequestConfig, TlsRootConfig,
};
pub use context::ClientContext;
pub use engine::{AsyncEngine, CloseMode, CompletionHandler};
pub use hyper_engine::HyperEngine;
pub use native::{
    ContentType, SimpleBody, SimpleRequest, SimpleResponse, reason_phrase, version_format,
};
pub use redirect::RedirectPolicy;
pub use request::to_simple_request;
pub use response::to_response;
pub use strategy::{CompletionStrategy, ResponseSlotHandler};
