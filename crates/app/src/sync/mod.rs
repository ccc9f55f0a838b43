//! Optimistic cart synchronisation
//!
//! [`CartSync`] owns the visible cart for the signed-in identity. Every mutating call applies
//! its change locally before the network round-trip, sends the semantic intent to the cart
//! service, and on success schedules a debounced authoritative reload. Reloads are tagged with
//! the generation they started in and discarded if the cart moved on meanwhile; while local
//! changes are unacknowledged, reloads are held back until they settle.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};
use trolley::{
    cart::Cart,
    identity::{Access, Identity, SessionKey, access, can_use_cart},
    lines::{CartLine, CartProduct, LineId},
    reducer::Mutation,
};

use crate::{
    api::{CartApi, CartApiError},
    debounce::Debouncer,
    snapshot::SnapshotStore,
};

mod errors;
mod intent;
mod view;

pub use errors::CartSyncError;
pub use view::{CartView, IgnoreReason, Outcome, SyncState};

use intent::Intent;

/// Quiet period after the last acknowledged change before the cart is reloaded.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Tunables for [`CartSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Debounce window for authoritative reloads.
    pub quiet_period: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Handle to the cart sync engine.
///
/// Cheap to clone; all clones share one cart. Dropping the last handle cancels any pending
/// reload, and results of reloads still in flight are discarded.
#[derive(Clone)]
pub struct CartSync {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn CartApi>,
    snapshots: Arc<dyn SnapshotStore>,
    debouncer: Debouncer,
    state: Mutex<State>,
    view: watch::Sender<CartView>,
}

#[derive(Debug)]
struct State {
    identity: Option<Identity>,
    cart: Cart,

    /// Bumped by every local change and identity transition; reloads started under an older
    /// generation are discarded.
    generation: u64,

    /// Bumped whenever the visible cart is replaced, including by accepted reloads.
    revision: u64,

    mutations_in_flight: usize,
    clears_in_flight: usize,
    reloads_in_flight: usize,
    reload_scheduled: bool,

    /// A reload was skipped or discarded while local changes were unacknowledged.
    reload_deferred: bool,

    initial_loading: bool,
}

impl State {
    fn access(&self) -> Access {
        access(self.identity.as_ref())
    }

    fn allowed_identity(&self) -> Option<&Identity> {
        self.identity
            .as_ref()
            .filter(|identity| can_use_cart(Some(identity)))
    }

    /// Local changes the server has not answered yet.
    fn unacknowledged(&self) -> usize {
        self.mutations_in_flight + self.clears_in_flight
    }

    fn sync_state(&self) -> SyncState {
        if !self.access().is_allowed() {
            SyncState::Disabled
        } else if self.unacknowledged() > 0 {
            SyncState::Optimistic
        } else if self.reload_scheduled || self.reloads_in_flight > 0 {
            SyncState::Reconciling
        } else {
            SyncState::Idle
        }
    }

    fn view(&self) -> CartView {
        CartView {
            cart: self.cart.clone(),
            initial_loading: self.initial_loading,
            state: self.sync_state(),
        }
    }

    fn replace_cart(&mut self, cart: Cart) {
        self.cart = cart;
        self.revision += 1;
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) {
        self.view.send_replace(state.view());
    }

    fn forget_snapshot(&self, key: SessionKey) {
        if let Err(error) = self.snapshots.clear(key) {
            warn!(%key, %error, "failed to clear cart snapshot");
        }
    }

    fn restore_snapshot(&self, key: SessionKey) -> Cart {
        match self.snapshots.load(key) {
            Ok(Some(lines)) => {
                debug!(%key, lines = lines.len(), "painting cart from snapshot");
                Cart::from_lines(lines)
            }
            Ok(None) => Cart::new(),
            Err(error) => {
                warn!(%key, %error, "ignoring unreadable cart snapshot");
                Cart::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Work {
    Mutation,
    Clear,
    Reload,
}

impl State {
    fn count(&mut self, work: Work) -> &mut usize {
        match work {
            Work::Mutation => &mut self.mutations_in_flight,
            Work::Clear => &mut self.clears_in_flight,
            Work::Reload => &mut self.reloads_in_flight,
        }
    }
}

/// Counts a unit of outstanding work for as long as it lives.
///
/// Created under the state lock. Dropping it takes the lock again, so it must never be
/// dropped while the lock is held; use [`InFlight::finish`] there instead. Owns a handle to
/// the engine so it can travel into spawned tasks.
struct InFlight {
    inner: Arc<Inner>,
    work: Work,
    finished: bool,
}

impl InFlight {
    fn begin(inner: &Arc<Inner>, state: &mut State, work: Work) -> Self {
        *state.count(work) += 1;

        Self {
            inner: Arc::clone(inner),
            work,
            finished: false,
        }
    }

    /// Stop counting under a lock the caller already holds; the caller publishes.
    fn finish(mut self, state: &mut State) {
        let count = state.count(self.work);
        *count = count.saturating_sub(1);
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let mut state = self.inner.state();
        let count = state.count(self.work);
        *count = count.saturating_sub(1);

        self.inner.publish(&state);
    }
}

/// What a mutation needs to settle once the server answers.
struct Pending {
    identity: Identity,
    previous: Cart,
    revision: u64,
}

impl CartSync {
    /// Create an engine with no identity and an empty cart.
    #[must_use]
    pub fn new(
        api: Arc<dyn CartApi>,
        snapshots: Arc<dyn SnapshotStore>,
        settings: SyncSettings,
    ) -> Self {
        let state = State {
            identity: None,
            cart: Cart::new(),
            generation: 0,
            revision: 0,
            mutations_in_flight: 0,
            clears_in_flight: 0,
            reloads_in_flight: 0,
            reload_scheduled: false,
            reload_deferred: false,
            initial_loading: true,
        };

        let view = watch::Sender::new(state.view());

        Self {
            inner: Arc::new(Inner {
                api,
                snapshots,
                debouncer: Debouncer::new(settings.quiet_period),
                state: Mutex::new(state),
                view,
            }),
        }
    }

    /// Visible cart lines.
    pub fn lines(&self) -> Vec<CartLine> {
        self.inner.state().cart.lines().to_vec()
    }

    /// Visible cart.
    pub fn cart(&self) -> Cart {
        self.inner.state().cart.clone()
    }

    /// True until the first reload for the current identity completes.
    pub fn initial_loading(&self) -> bool {
        self.inner.state().initial_loading
    }

    /// Current engine state.
    pub fn state(&self) -> SyncState {
        self.inner.state().sync_state()
    }

    /// Current identity.
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state().identity.clone()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.inner.state().generation
    }

    /// Receive every published [`CartView`].
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.inner.view.subscribe()
    }

    /// Switch to `identity`, then reload if it may use the cart.
    ///
    /// A new identity discards the previous cart and any pending reload. An identity that may
    /// not use the cart leaves the engine disabled with an empty cart, and the previous
    /// session's snapshot is forgotten.
    ///
    /// # Errors
    ///
    /// Returns an error if the reload fails; the cart keeps whatever it painted meanwhile.
    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), CartSyncError> {
        let allowed = {
            let mut state = self.inner.state();
            let access = access(identity.as_ref());

            if state.identity != identity {
                let previous = mem::replace(&mut state.identity, identity.clone());

                state.generation += 1;
                state.reload_scheduled = false;
                state.reload_deferred = false;
                self.inner.debouncer.cancel();

                let cart = match identity.as_ref() {
                    Some(identity) if access.is_allowed() => {
                        info!(account = identity.id, role = %identity.role, "cart enabled");
                        state.initial_loading = true;
                        self.inner.restore_snapshot(identity.session_key())
                    }
                    _ => {
                        info!(?access, "cart disabled");

                        if let Some(previous) = previous.filter(|previous| can_use_cart(Some(previous))) {
                            self.inner.forget_snapshot(previous.session_key());
                        }

                        Cart::new()
                    }
                };

                state.replace_cart(cart);
            }

            if !access.is_allowed() {
                state.initial_loading = false;
            }

            self.inner.publish(&state);

            access.is_allowed()
        };

        if allowed {
            self.load_cart().await
        } else {
            Ok(())
        }
    }

    /// Replace the visible cart with the server's.
    ///
    /// Without cart access this just empties the cart. While local changes are unacknowledged
    /// the reload is deferred until they settle, and a response that arrives after a newer
    /// local change or an identity switch is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service fails; the visible cart is left untouched.
    pub async fn load_cart(&self) -> Result<(), CartSyncError> {
        let (identity, generation, in_flight) = {
            let mut state = self.inner.state();
            state.reload_scheduled = false;

            let Some(identity) = state.allowed_identity().cloned() else {
                if !state.cart.is_empty() {
                    state.replace_cart(Cart::new());
                }

                state.initial_loading = false;
                self.inner.publish(&state);

                return Ok(());
            };

            if state.unacknowledged() > 0 {
                debug!(
                    unacknowledged = state.unacknowledged(),
                    "deferring cart reload until local changes settle"
                );
                state.reload_deferred = true;
                self.inner.publish(&state);

                return Ok(());
            }

            let in_flight = InFlight::begin(&self.inner, &mut state, Work::Reload);
            self.inner.publish(&state);

            (identity, state.generation, in_flight)
        };

        let result = self.inner.api.fetch_cart().await;
        drop(in_flight);

        let mut state = self.inner.state();

        if state.identity.as_ref() != Some(&identity) {
            debug!(account = identity.id, "identity changed during reload; discarding");
            return Ok(());
        }

        state.initial_loading = false;

        let lines = match result {
            Ok(lines) => lines,
            Err(error) => {
                self.inner.publish(&state);
                warn!(%error, "cart reload failed; keeping last known cart");
                return Err(error.into());
            }
        };

        if state.generation != generation || state.unacknowledged() > 0 {
            debug!(
                started = generation,
                current = state.generation,
                unacknowledged = state.unacknowledged(),
                "discarding stale cart reload"
            );

            if state.unacknowledged() == 0 {
                self.schedule_reload(&mut state);
            } else {
                state.reload_deferred = true;
            }

            self.inner.publish(&state);

            return Ok(());
        }

        state.replace_cart(Cart::from_server(lines));
        self.inner.publish(&state);

        let snapshot = state.cart.lines().to_vec();
        drop(state);

        debug!(lines = snapshot.len(), "cart reloaded");

        if let Err(error) = self.inner.snapshots.save(identity.session_key(), &snapshot) {
            warn!(%error, "failed to save cart snapshot");
        }

        Ok(())
    }

    /// Add `quantity` units of `product` with `option_id`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service rejects or fails the change.
    pub async fn add_to_cart(
        &self,
        product: CartProduct,
        option_id: Option<u64>,
        quantity: i64,
    ) -> Result<Outcome, CartSyncError> {
        self.mutate(Mutation::AddLine {
            product,
            option_id,
            quantity,
        })
        .await
    }

    /// Add several `(option_id, quantity)` selections of one product, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first selection that fails.
    pub async fn add_selections(
        &self,
        product: &CartProduct,
        selections: &[(Option<u64>, i64)],
    ) -> Result<Vec<Outcome>, CartSyncError> {
        let mut outcomes = Vec::with_capacity(selections.len());

        for &(option_id, quantity) in selections {
            outcomes.push(
                self.add_to_cart(product.clone(), option_id, quantity)
                    .await?,
            );
        }

        Ok(outcomes)
    }

    /// Set the quantity of a line; values below one become one.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service rejects or fails the change.
    pub async fn update_quantity(
        &self,
        line_id: LineId,
        quantity: i64,
    ) -> Result<Outcome, CartSyncError> {
        self.mutate(Mutation::SetQuantity { line_id, quantity })
            .await
    }

    /// Move a line to another option of the same product.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service rejects or fails the change.
    pub async fn change_option(
        &self,
        line_id: LineId,
        option_id: u64,
    ) -> Result<Outcome, CartSyncError> {
        self.mutate(Mutation::ChangeOption { line_id, option_id })
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service fails the change.
    pub async fn delete_item(&self, line_id: LineId) -> Result<Outcome, CartSyncError> {
        self.mutate(Mutation::RemoveLine { line_id }).await
    }

    /// Empty the cart immediately and tell the server in the background.
    ///
    /// Cancels any pending reload and forgets the session's snapshot. The engine stays
    /// optimistic until the server answers, and reloads started meanwhile are discarded.
    /// Whether the remote clear succeeds or fails, one reload follows it; failures are
    /// otherwise only logged.
    pub fn clear_cart(&self) -> Outcome {
        let (identity, in_flight) = {
            let mut state = self.inner.state();

            state.generation += 1;
            state.reload_scheduled = false;
            self.inner.debouncer.cancel();
            state.replace_cart(Cart::new());

            let Some(identity) = state.allowed_identity().cloned() else {
                self.inner.publish(&state);
                debug!(mutation = "clear", "cart access denied; ignoring");

                return Outcome::Ignored(IgnoreReason::AccessDenied);
            };

            let in_flight = InFlight::begin(&self.inner, &mut state, Work::Clear);
            self.inner.publish(&state);

            (identity, in_flight)
        };

        self.inner.forget_snapshot(identity.session_key());

        let api = Arc::clone(&self.inner.api);

        tokio::spawn(async move {
            if let Err(error) = api.clear_cart().await {
                warn!(account = identity.id, %error, "failed to clear remote cart");
            }

            let sync = CartSync {
                inner: Arc::clone(&in_flight.inner),
            };

            sync.after_clear(&identity, in_flight);
        });

        Outcome::Applied
    }

    fn after_clear(&self, identity: &Identity, in_flight: InFlight) {
        let mut state = self.inner.state();
        in_flight.finish(&mut state);

        if state.identity.as_ref() == Some(identity) {
            self.schedule_reload(&mut state);
        } else {
            self.resume_deferred_reload(&mut state);
        }

        self.inner.publish(&state);
    }

    /// Cancel any pending reload.
    pub fn close(&self) {
        let mut state = self.inner.state();

        self.inner.debouncer.cancel();
        state.reload_scheduled = false;
        self.inner.publish(&state);
    }

    async fn mutate(&self, mutation: Mutation) -> Result<Outcome, CartSyncError> {
        let name = mutation.name();

        let (intent, pending, in_flight) = {
            let mut state = self.inner.state();

            let Some(identity) = state.allowed_identity().cloned() else {
                let access = state.access();
                debug!(mutation = name, ?access, "cart access denied; ignoring");
                return Ok(Outcome::Ignored(IgnoreReason::AccessDenied));
            };

            if let Some(line_id) = mutation.target()
                && !state.cart.contains(line_id)
            {
                debug!(mutation = name, %line_id, "line vanished; ignoring");
                return Ok(Outcome::Ignored(IgnoreReason::LineVanished));
            }

            let server_id = mutation.target().and_then(LineId::server);
            let Some(intent) = Intent::new(&mutation, server_id) else {
                debug!(mutation = name, "line not confirmed yet; ignoring");
                return Ok(Outcome::Ignored(IgnoreReason::Unconfirmed));
            };

            let previous = state.cart.clone();
            let next = state.cart.apply(&mutation);

            state.replace_cart(next);
            state.generation += 1;

            let in_flight = InFlight::begin(&self.inner, &mut state, Work::Mutation);
            self.inner.publish(&state);

            let pending = Pending {
                identity,
                previous,
                revision: state.revision,
            };

            (intent, pending, in_flight)
        };

        debug!(mutation = name, ?intent, "sending cart change");

        let result = intent.send(self.inner.api.as_ref()).await;

        self.settle(name, pending, in_flight, result)
    }

    fn settle(
        &self,
        name: &'static str,
        pending: Pending,
        in_flight: InFlight,
        result: Result<(), CartApiError>,
    ) -> Result<Outcome, CartSyncError> {
        let mut state = self.inner.state();
        in_flight.finish(&mut state);

        if state.identity.as_ref() != Some(&pending.identity) {
            debug!(mutation = name, "identity changed while the change was in flight");
            self.resume_deferred_reload(&mut state);
            self.inner.publish(&state);

            return match result {
                Ok(()) => Ok(Outcome::Applied),
                Err(CartApiError::NotFound) => Ok(Outcome::Ignored(IgnoreReason::LineVanished)),
                Err(error) => Err(error.into()),
            };
        }

        match result {
            Ok(()) => {
                self.schedule_reload(&mut state);

                Ok(Outcome::Applied)
            }
            Err(CartApiError::NotFound) => {
                debug!(mutation = name, "line vanished on the server");
                self.schedule_reload(&mut state);

                Ok(Outcome::Ignored(IgnoreReason::LineVanished))
            }
            Err(error) => {
                if state.revision == pending.revision {
                    warn!(mutation = name, %error, "cart change failed; rolling back");
                    state.replace_cart(pending.previous);
                    self.inner.publish(&state);
                    self.resume_deferred_reload(&mut state);
                } else {
                    warn!(
                        mutation = name,
                        %error,
                        "cart change failed after newer changes; reloading"
                    );
                    self.schedule_reload(&mut state);
                }

                Err(error.into())
            }
        }
    }

    /// Debounce a reload if the identity may use the cart.
    ///
    /// The scheduled task holds only a weak handle, so it does nothing once every
    /// [`CartSync`] is gone.
    fn schedule_reload(&self, state: &mut State) {
        if !state.access().is_allowed() {
            return;
        }

        state.reload_scheduled = true;
        state.reload_deferred = false;
        self.inner.publish(state);

        let inner = Arc::downgrade(&self.inner);

        self.inner.debouncer.schedule(async move {
            let Some(inner) = inner.upgrade() else {
                return;
            };

            if let Err(error) = (CartSync { inner }).load_cart().await {
                warn!(%error, "debounced cart reload failed");
            }
        });
    }

    /// Schedule a reload that was held back, once nothing local is left unacknowledged.
    fn resume_deferred_reload(&self, state: &mut State) {
        if state.reload_deferred && state.unacknowledged() == 0 {
            self.schedule_reload(state);
        }
    }
}

impl Debug for CartSync {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let state = self.inner.state();

        f.debug_struct("CartSync")
            .field("identity", &state.identity)
            .field("lines", &state.cart.len())
            .field("generation", &state.generation)
            .field("state", &state.sync_state())
            .finish_non_exhaustive()
    }
}
