//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the seams the
//! sync engine depends on:
//! - `HttpClient` using `reqwest`
//! - `JournalVault` as JSON documents under the app data directory,
//!   written atomically via `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileVault, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = Arc::new(ReqwestHttpClient::new());
//!     let vault = Arc::new(FileVault::new());
//!
//!     // Hand both to the core configuration.
//! }
//! ```

mod http;
mod vault;

pub use http::ReqwestHttpClient;
pub use vault::FileVault;
