#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Transport-agnostic HTTP model for courier clients
//!
//! This crate holds what a declarative client needs to talk HTTP without
//! knowing which engine performs the I/O:
//! - [`Request`] / [`Response`] with an insertion-ordered, case-insensitive
//!   [`HeaderMultimap`]
//! - per-call [`Options`] (connect timeout, read timeout, redirect following)
//! - [`ProtocolVersion`] of a completed exchange
//! - the [`AsyncClient`] trait engines adapt to
//! - [`PendingResponse`], the single-assignment future returned by `execute`
//!
//! # Example
//!
//! ```ignore
//! use courier_core::{AsyncClient, Options, Request};
//!
//! let request = Request::builder(http::Method::GET, "https://api.example.com/users")
//!     .header("Accept", "application/json")
//!     .build();
//!
//! let users: Vec<User> = client
//!     .execute(request, &Options::default(), None)?
//!     .await?
//!     .error_for_status()?
//!     .json()?;
//! ```

mod client;
mod error;
mod headers;
mod options;
mod pending;
mod protocol;
mod request;
mod response;

pub use client::AsyncClient;
pub use error::HttpError;
pub use headers::HeaderMultimap;
pub use options::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Options};
pub use pending::{PendingResponse, ResponseSlot, pending};
pub use protocol::ProtocolVersion;
pub use request::{Request, RequestBuilder, UTF_8};
pub use response::{Response, ResponseBuilder};
