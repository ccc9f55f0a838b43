//! Optimistic cart synchronisation against a remote storefront cart service.

pub mod api;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod report;
pub mod snapshot;
pub mod sync;
