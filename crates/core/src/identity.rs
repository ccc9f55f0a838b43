//! Session identity and the cart access gate.

use std::{
    convert::Infallible,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Shopper account.
    Customer,

    /// Store administrator; has no cart.
    Admin,

    /// Any other role reported by the session service.
    Other(String),
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let role = if value.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else if value.eq_ignore_ascii_case("user") || value.eq_ignore_ascii_case("customer") {
            Self::Customer
        } else {
            Self::Other(value.to_string())
        };

        Ok(role)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Customer => f.write_str("USER"),
            Self::Admin => f.write_str("ADMIN"),
            Self::Other(role) => f.write_str(role),
        }
    }
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Account id.
    pub id: u64,

    /// Account role.
    pub role: Role,
}

impl Identity {
    /// Create a new identity.
    pub const fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }

    /// A shopper identity.
    pub const fn customer(id: u64) -> Self {
        Self::new(id, Role::Customer)
    }

    /// An administrator identity.
    pub const fn admin(id: u64) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Key under which this identity's cart snapshot is stored.
    pub const fn session_key(&self) -> SessionKey {
        SessionKey(self.id)
    }
}

/// Snapshot cache key for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(u64);

impl SessionKey {
    /// Key for the given account id.
    pub const fn new(account_id: u64) -> Self {
        Self(account_id)
    }

    /// The account id.
    pub const fn account_id(self) -> u64 {
        self.0
    }
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "cart-{}", self.0)
    }
}

/// Whether an identity may hold a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Cart operations are permitted.
    Allowed,

    /// Nobody is signed in.
    Anonymous,

    /// Administrators do not shop.
    Administrator,
}

impl Access {
    /// Whether cart operations are permitted.
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Classify `identity` for cart access.
pub fn access(identity: Option<&Identity>) -> Access {
    match identity {
        None => Access::Anonymous,
        Some(Identity {
            role: Role::Admin, ..
        }) => Access::Administrator,
        Some(_) => Access::Allowed,
    }
}

/// True iff an identity is present and is not an administrator.
pub fn can_use_cart(identity: Option<&Identity>) -> bool {
    access(identity).is_allowed()
}
