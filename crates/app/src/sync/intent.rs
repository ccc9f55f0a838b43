//! Remote intents derived from optimistic mutations.

use trolley::{lines::Quantity, reducer::Mutation};

use crate::api::{CartApi, CartApiError};

/// What the server is asked to do for a mutation.
///
/// Carries the semantic request (a quantity delta for adds, an absolute quantity for updates)
/// rather than the optimistic line, and only ever server line ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Intent {
    Add {
        product_id: u64,
        option_id: Option<u64>,
        quantity: Quantity,
    },
    SetQuantity {
        line_id: u64,
        quantity: Quantity,
    },
    ChangeOption {
        line_id: u64,
        option_id: u64,
    },
    Delete {
        line_id: u64,
    },
}

impl Intent {
    /// `None` when the mutation targets a line without a server id, or is a clear.
    pub(super) fn new(mutation: &Mutation, server_id: Option<u64>) -> Option<Self> {
        match *mutation {
            Mutation::AddLine {
                ref product,
                option_id,
                quantity,
            } => Some(Self::Add {
                product_id: product.product_id,
                option_id,
                quantity: Quantity::clamped(quantity),
            }),
            Mutation::SetQuantity { quantity, .. } => server_id.map(|line_id| Self::SetQuantity {
                line_id,
                quantity: Quantity::clamped(quantity),
            }),
            Mutation::ChangeOption { option_id, .. } => {
                server_id.map(|line_id| Self::ChangeOption { line_id, option_id })
            }
            Mutation::RemoveLine { .. } => server_id.map(|line_id| Self::Delete { line_id }),
            Mutation::Clear => None,
        }
    }

    pub(super) async fn send(self, api: &dyn CartApi) -> Result<(), CartApiError> {
        match self {
            Self::Add {
                product_id,
                option_id,
                quantity,
            } => api.add_line(product_id, option_id, quantity).await,
            Self::SetQuantity { line_id, quantity } => api.set_quantity(line_id, quantity).await,
            Self::ChangeOption { line_id, option_id } => {
                api.change_option(line_id, option_id).await
            }
            Self::Delete { line_id } => api.delete_line(line_id).await,
        }
    }
}
