//! Reconciliation of authoritative cart responses.

use rustc_hash::FxHashMap;

use crate::lines::{CartLine, IdentityKey};

/// Normalise lines received from the server before they replace local state.
///
/// `sold_out` is recomputed from stock, and lines sharing an identity key are folded into the
/// first occurrence with their quantities summed.
pub fn reconcile(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut positions = FxHashMap::<IdentityKey, usize>::default();
    let mut reconciled: Vec<CartLine> = Vec::with_capacity(lines.len());

    for mut line in lines {
        line.refresh_sold_out();

        let key = line.identity_key();

        if let Some(existing) = positions
            .get(&key)
            .and_then(|&position| reconciled.get_mut(position))
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            continue;
        }

        positions.insert(key, reconciled.len());
        reconciled.push(line);
    }

    reconciled
}
