//! Role and account identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

const PUBLIC: &str = "PUBLIC";
const BLACKLIST: &str = "BLACKLIST";
const SUPER_ADMIN: &str = "SUPER_ADMIN";
const SITE_ADMIN: &str = "SITE_ADMIN";

/// An opaque role identifier.
///
/// Three identifiers are fixed: [`Role::public`], [`Role::blacklist`] and
/// [`Role::super_admin`]. [`Role::site_admin`] is symbolic: in header origins
/// and as a role admin it stands for whichever identifier the site-admin
/// setting holds at check time. It is also that setting's initial value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Matches every account except blacklisted ones.
    pub fn public() -> Self {
        Self(PUBLIC.to_string())
    }

    /// Marks an account as globally denied public access.
    pub fn blacklist() -> Self {
        Self(BLACKLIST.to_string())
    }

    /// Root of the admin graph; holders pass every role check.
    pub fn super_admin() -> Self {
        Self(SUPER_ADMIN.to_string())
    }

    /// Alias for the current site-admin identifier.
    pub fn site_admin() -> Self {
        Self(SITE_ADMIN.to_string())
    }

    /// Get the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC
    }

    pub fn is_blacklist(&self) -> bool {
        self.0 == BLACKLIST
    }

    pub fn is_super_admin(&self) -> bool {
        self.0 == SUPER_ADMIN
    }

    pub fn is_site_admin(&self) -> bool {
        self.0 == SITE_ADMIN
    }

    /// Whether this identifier can never be used as a resource role or site-admin role.
    ///
    /// The current site-admin identifier is also off limits, but it is dynamic
    /// and checked by the role graph.
    pub fn is_fixed_reserved(&self) -> bool {
        self.is_public() || self.is_blacklist() || self.is_super_admin()
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({})", self.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a caller or chunk publisher.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The empty identity, used where no caller is known.
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    /// Get the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
