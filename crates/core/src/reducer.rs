//! Cart Reducer
//!
//! Pure state transitions used for optimistic updates. Every transition returns a new
//! collection and leaves its input untouched; a mutation whose target line has vanished
//! returns the lines unchanged.

use crate::lines::{CartLine, CartProduct, IdentityKey, LineId, LineOption, Quantity};

/// A change to the cart contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Add `quantity` units of `product`, merging into an existing line with the same
    /// identity key.
    AddLine {
        /// Product being added.
        product: CartProduct,

        /// Selected option.
        option_id: Option<u64>,

        /// Requested units; floored at one.
        quantity: i64,
    },

    /// Replace the quantity of a line; floored at one.
    SetQuantity {
        /// Target line.
        line_id: LineId,

        /// New quantity.
        quantity: i64,
    },

    /// Point a line at another option of the same product.
    ChangeOption {
        /// Target line.
        line_id: LineId,

        /// New option id.
        option_id: u64,
    },

    /// Remove a line.
    RemoveLine {
        /// Target line.
        line_id: LineId,
    },

    /// Remove every line.
    Clear,
}

impl Mutation {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddLine { .. } => "add_line",
            Self::SetQuantity { .. } => "set_quantity",
            Self::ChangeOption { .. } => "change_option",
            Self::RemoveLine { .. } => "remove_line",
            Self::Clear => "clear",
        }
    }

    /// The existing line this mutation targets, if any.
    pub const fn target(&self) -> Option<LineId> {
        match self {
            Self::SetQuantity { line_id, .. }
            | Self::ChangeOption { line_id, .. }
            | Self::RemoveLine { line_id } => Some(*line_id),
            Self::AddLine { .. } | Self::Clear => None,
        }
    }
}

/// Apply `mutation` to `lines`, minting placeholder ids for new lines.
pub fn apply(lines: &[CartLine], mutation: &Mutation) -> Vec<CartLine> {
    apply_with(lines, mutation, LineId::placeholder)
}

/// Apply `mutation` to `lines`, taking new line ids from `next_id`.
pub fn apply_with<F>(lines: &[CartLine], mutation: &Mutation, next_id: F) -> Vec<CartLine>
where
    F: FnOnce() -> LineId,
{
    match mutation {
        Mutation::AddLine {
            product,
            option_id,
            quantity,
        } => add_line(lines, product, *option_id, Quantity::clamped(*quantity), next_id),
        Mutation::SetQuantity { line_id, quantity } => {
            let quantity = Quantity::clamped(*quantity);

            update_line(lines, *line_id, |line| line.quantity = quantity)
        }
        Mutation::ChangeOption { line_id, option_id } => {
            update_line(lines, *line_id, |line| {
                if line.option_id() != Some(*option_id) {
                    line.option = Some(LineOption::placeholder(*option_id));
                }
            })
        }
        Mutation::RemoveLine { line_id } => lines
            .iter()
            .filter(|line| line.line_id != *line_id)
            .cloned()
            .collect(),
        Mutation::Clear => Vec::new(),
    }
}

fn add_line<F>(
    lines: &[CartLine],
    product: &CartProduct,
    option_id: Option<u64>,
    quantity: Quantity,
    next_id: F,
) -> Vec<CartLine>
where
    F: FnOnce() -> LineId,
{
    let key = IdentityKey::new(product.product_id, option_id);

    let mut next = lines.to_vec();

    if let Some(existing) = next.iter_mut().find(|line| line.identity_key() == key) {
        existing.quantity = existing.quantity.saturating_add(quantity);
    } else {
        next.push(CartLine::from_product(
            next_id(),
            product,
            option_id,
            quantity,
        ));
    }

    next
}

fn update_line<F>(lines: &[CartLine], line_id: LineId, update: F) -> Vec<CartLine>
where
    F: Fn(&mut CartLine),
{
    lines
        .iter()
        .cloned()
        .map(|mut line| {
            if line.line_id == line_id {
                update(&mut line);
            }

            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn product(product_id: u64, stock: u32) -> CartProduct {
        CartProduct {
            product_id,
            product_name: format!("Product {product_id}"),
            sell_price: 12_000,
            stock,
            main_image: Some(format!("https://cdn.example.com/{product_id}.jpg")),
        }
    }

    fn add(product_id: u64, option_id: Option<u64>, quantity: i64) -> Mutation {
        Mutation::AddLine {
            product: product(product_id, 5),
            option_id,
            quantity,
        }
    }

    fn server_line(line_id: u64, product_id: u64, option_id: Option<u64>) -> CartLine {
        CartLine::from_product(
            LineId::Server(line_id),
            &product(product_id, 5),
            option_id,
            Quantity::clamped(2),
        )
    }

    #[test]
    fn add_line_appends_placeholder_line() {
        let id = LineId::Placeholder(Uuid::nil());
        let lines = apply_with(&[], &add(10, None, 2), || id);

        assert_eq!(lines.len(), 1);

        let line = lines.first();

        assert_eq!(line.map(|line| line.line_id), Some(id));
        assert_eq!(line.map(|line| line.quantity.get()), Some(2));
        assert_eq!(line.map(|line| line.sold_out), Some(false));
    }

    #[test]
    fn add_line_merges_same_identity_key() {
        let lines = apply(&[], &add(10, Some(3), 1));
        let lines = apply(&lines, &add(10, Some(3), 1));

        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|line| line.quantity.get()), Some(2));
    }

    #[test]
    fn add_line_merges_into_server_line_without_new_id() {
        let existing = [server_line(1, 10, None)];

        let lines = apply(&existing, &add(10, None, 3));

        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|line| line.line_id), Some(LineId::Server(1)));
        assert_eq!(lines.first().map(|line| line.quantity.get()), Some(5));
    }

    #[test]
    fn add_line_keeps_option_and_no_option_distinct() {
        let lines = apply(&[], &add(5, None, 1));
        let lines = apply(&lines, &add(5, Some(7), 1));

        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn add_line_of_out_of_stock_product_is_sold_out() {
        let mutation = Mutation::AddLine {
            product: product(10, 0),
            option_id: None,
            quantity: 1,
        };

        let lines = apply(&[], &mutation);

        assert_eq!(lines.first().map(|line| line.sold_out), Some(true));
    }

    #[test]
    fn add_line_floors_quantity() {
        let lines = apply(&[], &add(10, None, 0));

        assert_eq!(lines.first().map(|line| line.quantity.get()), Some(1));
    }

    #[test]
    fn set_quantity_clamps_to_one() {
        let existing = [server_line(1, 10, None)];

        for requested in [0, -3] {
            let lines = apply(
                &existing,
                &Mutation::SetQuantity {
                    line_id: LineId::Server(1),
                    quantity: requested,
                },
            );

            assert_eq!(
                lines.first().map(|line| line.quantity.get()),
                Some(1),
                "quantity {requested} should clamp to 1"
            );
        }
    }

    #[test]
    fn set_quantity_only_touches_matching_line() {
        let existing = [server_line(1, 10, None), server_line(2, 11, None)];

        let lines = apply(
            &existing,
            &Mutation::SetQuantity {
                line_id: LineId::Server(2),
                quantity: 9,
            },
        );

        let quantities: Vec<u32> = lines.iter().map(|line| line.quantity.get()).collect();

        assert_eq!(quantities, vec![2, 9]);
    }

    #[test]
    fn change_option_renames_without_merging() {
        let existing = [server_line(1, 10, Some(3)), server_line(2, 10, Some(4))];

        let lines = apply(
            &existing,
            &Mutation::ChangeOption {
                line_id: LineId::Server(1),
                option_id: 4,
            },
        );

        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().and_then(CartLine::option_id), Some(4));
        assert_eq!(lines.first().map(|line| line.line_id), Some(LineId::Server(1)));
    }

    #[test]
    fn change_option_to_same_option_keeps_details() {
        let mut line = server_line(1, 10, Some(3));
        line.option = Some(LineOption {
            option_id: 3,
            option_type: "SIZE".to_string(),
            option_title: Some("Size".to_string()),
            option_value: Some("M".to_string()),
        });

        let existing = [line.clone()];

        let lines = apply(
            &existing,
            &Mutation::ChangeOption {
                line_id: LineId::Server(1),
                option_id: 3,
            },
        );

        assert_eq!(lines, vec![line]);
    }

    #[test]
    fn remove_line_filters_target() {
        let existing = [server_line(1, 10, None), server_line(2, 11, None)];

        let lines = apply(
            &existing,
            &Mutation::RemoveLine {
                line_id: LineId::Server(1),
            },
        );

        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|line| line.line_id), Some(LineId::Server(2)));
    }

    #[test]
    fn clear_empties_cart() {
        let existing = [server_line(1, 10, None), server_line(2, 11, None)];

        assert!(apply(&existing, &Mutation::Clear).is_empty());
    }

    #[test]
    fn vanished_targets_are_no_ops() {
        let existing = vec![server_line(1, 10, None)];
        let missing = LineId::Server(99);

        for mutation in [
            Mutation::SetQuantity {
                line_id: missing,
                quantity: 4,
            },
            Mutation::ChangeOption {
                line_id: missing,
                option_id: 2,
            },
            Mutation::RemoveLine { line_id: missing },
        ] {
            assert_eq!(
                apply(&existing, &mutation),
                existing,
                "{} on a missing line should be a no-op",
                mutation.name()
            );
        }
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let existing = vec![server_line(1, 10, None)];
        let before = existing.clone();

        let _next = apply(&existing, &add(10, None, 4));

        assert_eq!(existing, before);
    }

    #[test]
    fn target_reports_line_for_line_mutations() {
        assert_eq!(add(1, None, 1).target(), None);
        assert_eq!(Mutation::Clear.target(), None);
        assert_eq!(
            Mutation::RemoveLine {
                line_id: LineId::Server(3)
            }
            .target(),
            Some(LineId::Server(3))
        );
    }
}
