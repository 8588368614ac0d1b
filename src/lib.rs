//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-sync`, `core-runtime`, `provider-webdav`).
//! Host applications can depend on `daybook-workspace` and enable the
//! documented features without needing to wire each crate individually.

pub use bridge_traits;
pub use core_journal;
pub use core_runtime;
pub use core_sync;
pub use provider_webdav;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
