//! # WebDAV Provider
//!
//! Implements the `RemoteStore` trait for RFC 4918 WebDAV servers.
//!
//! ## Overview
//!
//! This crate provides:
//! - Timestamped, append-only snapshot backups via PUT
//! - Latest-backup discovery via depth-1 PROPFIND listing
//! - Namespace-agnostic multistatus parsing
//! - Uniform retry with exponential backoff over `HttpClient`
//! - HTTP Basic authentication from persisted sync settings

pub mod client;
pub mod error;
pub mod multistatus;

pub use client::{WebDavConfig, WebDavStore};
pub use error::{Result, WebDavError};
pub use multistatus::ResourceEntry;
