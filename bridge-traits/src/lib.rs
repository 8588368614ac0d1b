//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the transport contract between the sync engine and
//! platform-specific implementations. The engine core never talks to the
//! network directly; it builds [`HttpRequest`](http::HttpRequest) values and
//! hands them to whatever [`HttpClient`](http::HttpClient) the host injected.
//!
//! - [`HttpClient`](http::HttpClient) - single-attempt async HTTP transport
//!   (including the DAV verbs `PROPFIND`/`MKCOL`)
//! - [`RetryPolicy`](http::RetryPolicy) - the backoff schedule the remote
//!   store client applies uniformly on top of the transport
//!
//! ## Error Handling
//!
//! Implementations convert platform-specific failures into
//! [`BridgeError`](error::BridgeError): `Connection` and `Timeout` for
//! transport faults (the retryable class), `OperationFailed` for everything
//! else. Non-2xx statuses are responses, not errors.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;

pub use error::BridgeError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
