//! Cart table rendering.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;
use trolley::cart::{Cart, CartError};

use crate::sync::CartView;

/// Errors raised while writing a cart table.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The subtotal does not fit the price type.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Writing to the output failed.
    #[error("failed to write cart")]
    Io(#[from] io::Error),
}

/// Write the cart in `view` as a table followed by its subtotal.
///
/// # Errors
///
/// Returns an error if the subtotal overflows or the output cannot be written.
pub fn write_cart(
    mut out: impl io::Write,
    view: &CartView,
    currency: &'static Currency,
) -> Result<(), ReportError> {
    let cart = &view.cart;

    if cart.is_empty() {
        writeln!(out, "Cart is empty.")?;

        return Ok(());
    }

    let mut table = cart_rows(cart, currency).build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..7), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} items, subtotal {}",
        cart.total_quantity(),
        price(cart.subtotal()?, currency)
    )?;

    for line in cart.sold_out_lines() {
        writeln!(out, "{} is sold out.", line.product_name)?;
    }

    Ok(())
}

fn cart_rows(cart: &Cart, currency: &'static Currency) -> Builder {
    let mut builder = Builder::default();

    builder.push_record(["Line", "Product", "Option", "Stock", "Qty", "Price", "Total"]);

    for line in cart.lines() {
        let option = line
            .option
            .as_ref()
            .map(|option| {
                option
                    .option_value
                    .clone()
                    .unwrap_or_else(|| option.option_id.to_string())
            })
            .unwrap_or_default();

        let stock = if line.sold_out {
            "sold out".to_string()
        } else {
            line.stock_available.to_string()
        };

        let total = line
            .line_total()
            .map_or_else(|| "overflow".to_string(), |total| price(total, currency));

        builder.push_record([
            line.line_id.to_string(),
            line.product_name.clone(),
            option,
            stock,
            line.quantity.to_string(),
            price(line.unit_price, currency),
            total,
        ]);
    }

    builder
}

/// Cart prices are whole units of the display currency.
fn price(amount: i64, currency: &'static Currency) -> String {
    Money::from_major(amount, currency).to_string()
}
