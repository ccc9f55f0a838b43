//! Cart Lines

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifies a cart line.
///
/// Server ids are assigned by the remote cart store. Placeholders are minted locally for
/// optimistic lines and are replaced wholesale once an authoritative reload lands; they are
/// never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineId {
    /// Server-assigned identifier.
    Server(u64),

    /// Locally generated identifier for a line the server has not confirmed yet.
    Placeholder(Uuid),
}

impl LineId {
    /// Mint a fresh placeholder id.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::Placeholder(Uuid::now_v7())
    }

    /// The server id, if this line has been confirmed.
    pub const fn server(self) -> Option<u64> {
        match self {
            Self::Server(id) => Some(id),
            Self::Placeholder(_) => None,
        }
    }

    /// Whether this id was minted locally.
    pub const fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl Display for LineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Placeholder(uuid) => write!(f, "pending-{}", uuid.simple()),
        }
    }
}

impl From<u64> for LineId {
    fn from(value: u64) -> Self {
        Self::Server(value)
    }
}

/// A line quantity; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Floor `value` at one, saturating at `u32::MAX`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self(u32::try_from(value.max(1)).unwrap_or(u32::MAX))
    }

    /// Returns the raw quantity.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Adds two quantities, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = ZeroQuantity;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ZeroQuantity);
        }

        Ok(Self(value))
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// A quantity of zero was supplied where at least one unit is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quantity must be at least 1")]
pub struct ZeroQuantity;

/// The `(product, option)` pair that determines line uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    /// Product id.
    pub product_id: u64,

    /// Option id, `None` for a line without an option.
    pub option_id: Option<u64>,
}

impl IdentityKey {
    /// Create a new identity key.
    pub const fn new(product_id: u64, option_id: Option<u64>) -> Self {
        Self {
            product_id,
            option_id,
        }
    }
}

/// Product option attached to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOption {
    /// Option id.
    pub option_id: u64,

    /// Option type, e.g. `"SIZE"`.
    pub option_type: String,

    /// Display title.
    pub option_title: Option<String>,

    /// Display value.
    pub option_value: Option<String>,
}

impl LineOption {
    /// An option known only by id, used until the server fills in its details.
    #[must_use]
    pub fn placeholder(option_id: u64) -> Self {
        Self {
            option_id,
            option_type: String::new(),
            option_title: None,
            option_value: None,
        }
    }
}

/// Product details snapshotted into a new line by an add intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    /// Product id.
    pub product_id: u64,

    /// Product name.
    pub product_name: String,

    /// Unit sell price in whole currency units.
    pub sell_price: i64,

    /// Units in stock when the product was viewed.
    pub stock: u32,

    /// Main image URL.
    pub main_image: Option<String>,
}

/// One purchasable unit in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line id.
    pub line_id: LineId,

    /// Product id.
    pub product_id: u64,

    /// Product name.
    pub product_name: String,

    /// Thumbnail URL; empty when the product has no image.
    pub thumbnail_url: String,

    /// Units of the product in this line.
    pub quantity: Quantity,

    /// Unit price in whole currency units, captured when the line was added.
    pub unit_price: i64,

    /// Units the server reports in stock.
    pub stock_available: u32,

    /// Derived from `stock_available`; see [`CartLine::refresh_sold_out`].
    pub sold_out: bool,

    /// Selected option.
    pub option: Option<LineOption>,
}

impl CartLine {
    /// Build an unconfirmed line for `product`.
    #[must_use]
    pub fn from_product(
        line_id: LineId,
        product: &CartProduct,
        option_id: Option<u64>,
        quantity: Quantity,
    ) -> Self {
        Self {
            line_id,
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            thumbnail_url: product.main_image.clone().unwrap_or_default(),
            quantity,
            unit_price: product.sell_price,
            stock_available: product.stock,
            sold_out: product.stock == 0,
            option: option_id.map(LineOption::placeholder),
        }
    }

    /// The selected option id, if any.
    pub fn option_id(&self) -> Option<u64> {
        self.option.as_ref().map(|option| option.option_id)
    }

    /// The key this line is unique under.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.product_id, self.option_id())
    }

    /// Recompute `sold_out` from the stock level.
    pub fn refresh_sold_out(&mut self) {
        self.sold_out = self.stock_available == 0;
    }

    /// Price of the whole line, `None` on overflow.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity.get()))
    }
}
