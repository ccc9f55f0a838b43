//! What the sync engine exposes to its consumers.

use trolley::cart::Cart;

/// Lifecycle of the cart as seen by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing in flight; the visible cart matches the last reload.
    Idle,

    /// At least one optimistic change awaits acknowledgement.
    Optimistic,

    /// An authoritative reload is scheduled or running.
    Reconciling,

    /// The current identity may not use the cart.
    Disabled,
}

/// Result of a mutating call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The change was applied locally and acknowledged by the server.
    Applied,

    /// The call was a silent no-op.
    Ignored(IgnoreReason),
}

/// Why a mutating call was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The identity is signed out or an administrator.
    AccessDenied,

    /// The target line no longer exists locally or on the server.
    LineVanished,

    /// The target line has not been confirmed by the server yet.
    Unconfirmed,
}

/// Snapshot of the engine published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    /// Visible cart contents.
    pub cart: Cart,

    /// True until the first reload for the current identity completes.
    pub initial_loading: bool,

    /// Engine state.
    pub state: SyncState,
}

impl Default for CartView {
    fn default() -> Self {
        Self {
            cart: Cart::new(),
            initial_loading: true,
            state: SyncState::Disabled,
        }
    }
}
