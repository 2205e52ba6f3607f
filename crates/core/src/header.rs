//! Header policy records.
//!
//! A header describes how every resource that references it may be accessed:
//! cache policy (including the immutability flag), which methods are allowed,
//! which role may invoke each method, and an optional redirect.

use crate::hash::ContentHash;
use crate::method::{Method, MethodSet};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted redirect status code.
pub const MIN_REDIRECT_CODE: u16 = 300;

/// Highest accepted redirect status code.
pub const MAX_REDIRECT_CODE: u16 = 310;

/// Address of a stored header.
///
/// Headers are content-addressed; [`HeaderAddress::DEFAULT`] is the sentinel
/// slot holding the site default header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderAddress(ContentHash);

impl HeaderAddress {
    /// Sentinel address of the default header.
    pub const DEFAULT: HeaderAddress = HeaderAddress(ContentHash::ZERO);

    pub fn from_content_hash(hash: ContentHash) -> Self {
        Self(hash)
    }

    pub fn is_default(&self) -> bool {
        self.0.is_zero()
    }

    pub fn from_hex(s: &str) -> crate::Result<Self> {
        Ok(Self(ContentHash::from_hex(s)?))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for HeaderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "HeaderAddress(default)")
        } else {
            write!(f, "HeaderAddress({})", &self.to_hex()[..16])
        }
    }
}

impl fmt::Display for HeaderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Cache-control preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePreset {
    #[default]
    None,
    NoCache,
    Default,
    Short,
    Medium,
    Long,
    Permanent,
}

/// Cache policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default)]
    pub preset: CachePreset,
    /// Once set and the resource has content, writes are refused forever.
    #[serde(default)]
    pub immutable: bool,
    /// Free-form extension directives.
    #[serde(default)]
    pub custom: String,
}

/// Redirect policy. A zero code means no redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Redirect {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub location: String,
}

impl Redirect {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn to(code: u16, location: impl Into<String>) -> Self {
        Self {
            code,
            location: location.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.code != 0
    }
}

/// A header record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderContent {
    #[serde(default)]
    pub cache: CachePolicy,
    /// Methods allowed on resources using this header.
    pub methods: MethodSet,
    /// Role allowed to invoke each method, indexed by [`Method::index`].
    pub origins: Vec<Role>,
    #[serde(default)]
    pub redirect: Redirect,
}

impl HeaderContent {
    /// Header granting every method to `role`.
    pub fn uniform(role: Role) -> Self {
        Self {
            cache: CachePolicy::default(),
            methods: MethodSet::all(),
            origins: vec![role; Method::COUNT],
            redirect: Redirect::none(),
        }
    }

    /// Header where read verbs and OPTIONS are public and writes need `writer`.
    pub fn public_read(writer: Role) -> Self {
        let origins = Method::ALL
            .iter()
            .map(|m| {
                if m.is_write() {
                    writer.clone()
                } else {
                    Role::public()
                }
            })
            .collect();
        Self {
            cache: CachePolicy::default(),
            methods: MethodSet::all(),
            origins,
            redirect: Redirect::none(),
        }
    }

    /// Replace the allowed-method mask.
    pub fn with_methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    /// Set the origin role for a single method.
    pub fn with_origin(mut self, method: Method, role: Role) -> Self {
        if let Some(slot) = self.origins.get_mut(method.index()) {
            *slot = role;
        }
        self
    }

    /// Set the immutability flag.
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.cache.immutable = immutable;
        self
    }

    /// Set the redirect.
    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(method)
    }

    pub fn is_immutable(&self) -> bool {
        self.cache.immutable
    }

    /// Role allowed to invoke `method`, if the origins array covers it.
    pub fn origin(&self, method: Method) -> Option<&Role> {
        self.origins.get(method.index())
    }

    /// Check the structural invariants every stored header satisfies.
    pub fn validate(&self) -> crate::Result<()> {
        let code = self.redirect.code;
        if code != 0 && !(MIN_REDIRECT_CODE..=MAX_REDIRECT_CODE).contains(&code) {
            return Err(crate::Error::InvalidRedirect(code));
        }
        if self.origins.len() != Method::COUNT {
            return Err(crate::Error::InvalidHeader {
                expected: Method::COUNT,
                actual: self.origins.len(),
            });
        }
        Ok(())
    }

    /// Content address of this header.
    pub fn address(&self) -> crate::Result<HeaderAddress> {
        let encoded =
            serde_json::to_vec(self).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        Ok(HeaderAddress(ContentHash::compute(&encoded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_origins_length() {
        let mut header = HeaderContent::uniform(Role::public());
        assert!(header.validate().is_ok());

        header.origins.pop();
        assert_eq!(
            header.validate(),
            Err(crate::Error::InvalidHeader {
                expected: Method::COUNT,
                actual: Method::COUNT - 1
            })
        );

        header.origins.push(Role::public());
        header.origins.push(Role::public());
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_validate_redirect_range() {
        let base = HeaderContent::uniform(Role::public());
        for code in [0u16, 300, 301, 308, 310] {
            let header = base.clone().with_redirect(Redirect::to(code, "/elsewhere"));
            assert!(header.validate().is_ok(), "code {code} should be accepted");
        }
        for code in [1u16, 200, 299, 311, 404] {
            let header = base.clone().with_redirect(Redirect::to(code, "/elsewhere"));
            assert_eq!(header.validate(), Err(crate::Error::InvalidRedirect(code)));
        }
    }

    #[test]
    fn test_address_is_content_derived() {
        let a = HeaderContent::public_read(Role::site_admin());
        let b = HeaderContent::public_read(Role::site_admin());
        assert_eq!(a.address().unwrap(), b.address().unwrap());

        let c = a.clone().immutable(true);
        assert_ne!(a.address().unwrap(), c.address().unwrap());
        assert!(!a.address().unwrap().is_default());
    }

    #[test]
    fn test_public_read_origins() {
        let header = HeaderContent::public_read(Role::new("editors"));
        assert_eq!(header.origin(Method::Get), Some(&Role::public()));
        assert_eq!(header.origin(Method::Options), Some(&Role::public()));
        assert_eq!(header.origin(Method::Put), Some(&Role::new("editors")));
        assert_eq!(header.origin(Method::Define), Some(&Role::new("editors")));
    }
}
