//! # Core Runtime
//!
//! ## Overview
//!
//! Shared runtime services for the journal sync engine: dependency
//! wiring ([`config`]), the broadcast event bus ([`events`]), and
//! `tracing` setup ([`logging`]).
//!
//! Crates above this one take a validated [`config::CoreConfig`] and an
//! [`events::EventBus`] instead of constructing their own capabilities,
//! which keeps platform concerns at the edge of the workspace.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfigBuilder;
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//!
//! let config = CoreConfigBuilder::new()
//!     .with_vault(Arc::new(vault))
//!     .build()?;
//! let bus = EventBus::new(config.event_buffer_size());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
