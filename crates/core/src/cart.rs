//! Cart

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    lines::{CartLine, LineId},
    reconcile::reconcile,
    reducer::{Mutation, apply},
};

/// Errors related to cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartError {
    /// The subtotal does not fit in an `i64`.
    #[error("cart subtotal overflowed")]
    SubtotalOverflow,
}

/// An ordered, immutable set of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap lines as they are, without reconciliation.
    pub fn from_lines(lines: impl Into<Vec<CartLine>>) -> Self {
        Self {
            lines: lines.into(),
        }
    }

    /// Build a cart from an authoritative server response.
    pub fn from_server(lines: Vec<CartLine>) -> Self {
        Self {
            lines: reconcile(lines),
        }
    }

    /// Returns the cart with `mutation` applied.
    #[must_use]
    pub fn apply(&self, mutation: &Mutation) -> Self {
        Self {
            lines: apply(&self.lines, mutation),
        }
    }

    /// Cart lines in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart, returning its lines.
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Get the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find a line by id.
    pub fn find(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// Whether a line with this id is present.
    pub fn contains(&self, line_id: LineId) -> bool {
        self.find(line_id).is_some()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of unit price times quantity over every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::SubtotalOverflow`] if the total does not fit in an `i64`.
    pub fn subtotal(&self) -> Result<i64, CartError> {
        self.lines.iter().try_fold(0_i64, |total, line| {
            line.line_total()
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or(CartError::SubtotalOverflow)
        })
    }

    /// Lines whose product has run out of stock.
    pub fn sold_out_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| line.sold_out)
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self::from_lines(lines)
    }
}
