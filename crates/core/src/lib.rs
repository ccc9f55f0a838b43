//! Trolley
//!
//! Trolley keeps an optimistic, in-memory shopping cart consistent with an authoritative remote
//! cart store. This crate holds the pure parts: the line model, the access gate, the reducer
//! that computes optimistic transitions, and reconciliation of server responses.

pub mod cart;
pub mod identity;
pub mod lines;
pub mod prelude;
pub mod reconcile;
pub mod reducer;
