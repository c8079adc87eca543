//! Canonical address handling.
//!
//! Every address that crosses a component boundary is compared and stored through its canonical
//! form: `0x` followed by 40 lowercase hex digits. Checksums are never required on input.

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, sync::LazyLock};

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"));

/// Returned when a string is not a `0x`-prefixed 20-byte hex address.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid address `{0}`: expected 0x followed by 40 hex digits")]
pub struct AddressError(pub String);

/// Returns `true` if `s` matches `^0x[0-9a-fA-F]{40}$`.
pub fn is_valid_address(s: &str) -> bool {
    ADDRESS_RE.is_match(s)
}

/// Parses `s` into an [`Address`], ignoring the checksum casing.
pub fn parse_address(s: &str) -> Result<Address, AddressError> {
    let s = s.trim();
    if !is_valid_address(s) {
        return Err(AddressError(s.to_string()));
    }
    Address::from_str(s).map_err(|_| AddressError(s.to_string()))
}

/// Normalizes `s` to its canonical lowercase form.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)` for every valid input.
pub fn normalize(s: &str) -> Result<String, AddressError> {
    parse_address(s).map(|address| to_canonical(&address))
}

/// Formats an [`Address`] in canonical lowercase form.
pub fn to_canonical(address: &Address) -> String {
    format!("{address:#x}")
}

/// Compares two address strings case-insensitively. Invalid inputs never compare equal.
pub fn same_address(a: &str, b: &str) -> bool {
    matches!((parse_address(a), parse_address(b)), (Ok(a), Ok(b)) if a == b)
}

/// An [`Address`] that displays and serializes in canonical lowercase form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalAddress(Address);

impl CanonicalAddress {
    /// Wraps an address.
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the inner address.
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for CanonicalAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<CanonicalAddress> for Address {
    fn from(address: CanonicalAddress) -> Self {
        address.0
    }
}

impl PartialEq<Address> for CanonicalAddress {
    fn eq(&self, other: &Address) -> bool {
        self.0 == *other
    }
}

impl FromStr for CanonicalAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
