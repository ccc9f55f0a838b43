//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError},
    identity::{Access, Identity, Role, SessionKey, access, can_use_cart},
    lines::{CartLine, CartProduct, IdentityKey, LineId, LineOption, Quantity, ZeroQuantity},
    reconcile::reconcile,
    reducer::{Mutation, apply, apply_with},
};
