//! Protocol methods and method bitmasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol verb.
///
/// The discriminant is stable: it is the bit position in a [`MethodSet`] and
/// the index into a header's origins array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Method {
    Head = 0,
    Get = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
    Options = 5,
    Locate = 6,
    Define = 7,
}

impl Method {
    /// Number of supported verbs.
    pub const COUNT: usize = 8;

    /// All verbs in tag order.
    pub const ALL: [Method; Method::COUNT] = [
        Method::Head,
        Method::Get,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
        Method::Locate,
        Method::Define,
    ];

    /// Index into a header's origins array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit for this verb in a [`MethodSet`].
    pub fn bit(self) -> u16 {
        1u16 << (self as u8)
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Locate => "LOCATE",
            Self::Define => "DEFINE",
        }
    }

    /// Verbs that mutate state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Put | Self::Patch | Self::Delete | Self::Define
        )
    }

    /// Verbs that read a resource and honor conditional headers and redirects.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Head | Self::Get | Self::Locate)
    }

    /// Verbs that may target a path with no existing resource.
    pub fn may_create(&self) -> bool {
        matches!(self, Self::Put | Self::Define | Self::Options)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bitmask of allowed methods, one bit per [`Method`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodSet(u16);

impl MethodSet {
    const VALID_BITS: u16 = (1u16 << Method::COUNT) - 1;

    /// No methods allowed.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Every method allowed.
    pub fn all() -> Self {
        Self(Self::VALID_BITS)
    }

    /// Build from raw bits, discarding bits that do not name a method.
    pub fn from_bits(bits: u16) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    /// Raw bitmask.
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// Return a copy with `method` added.
    pub fn with(self, method: Method) -> Self {
        Self(self.0 | method.bit())
    }

    /// Return a copy with `method` removed.
    pub fn without(self, method: Method) -> Self {
        Self(self.0 & !method.bit())
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate allowed methods in tag order.
    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        Method::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(|m| m.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_dense_and_stable() {
        for (i, method) in Method::ALL.iter().enumerate() {
            assert_eq!(method.index(), i);
            assert_eq!(method.bit(), 1 << i);
        }
        assert_eq!(MethodSet::all().bits(), 0xff);
    }

    #[test]
    fn test_method_set_ops() {
        let set: MethodSet = [Method::Get, Method::Head].into_iter().collect();
        assert!(set.contains(Method::Get));
        assert!(!set.contains(Method::Put));
        assert_eq!(set.with(Method::Put).without(Method::Get).bits(), 0b101);
        assert_eq!(MethodSet::from_bits(0xffff), MethodSet::all());
        assert_eq!(set.to_string(), "HEAD, GET");
    }

    #[test]
    fn test_method_classes() {
        assert!(Method::Define.is_write());
        assert!(!Method::Options.is_write());
        assert!(Method::Locate.is_read());
        assert!(Method::Options.may_create());
        assert!(!Method::Patch.may_create());
    }
}
