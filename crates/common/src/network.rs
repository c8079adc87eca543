//! Network names as selected by the user, resolved to chain ids.

use alloy_chains::Chain;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Returned when a network name is neither a known chain nor a numeric chain id.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown network `{0}`")]
pub struct UnknownNetwork(pub String);

/// A network selected in a request, e.g. `sepolia` or `31337`.
///
/// The name is kept in lowercase, which is also the form persisted in contract references.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Network {
    name: String,
    chain_id: u64,
}

impl Network {
    /// Creates a network from an explicit chain id, naming it after the chain if it is known.
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self { name: Chain::from_id(chain_id).to_string().to_lowercase(), chain_id }
    }

    /// Ethereum's Sepolia testnet.
    pub fn sepolia() -> Self {
        Self::from_chain_id(11155111)
    }

    /// The lowercase network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The chain id this network resolves to.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let chain = Chain::from_str(&name).map_err(|_| UnknownNetwork(s.to_string()))?;
        Ok(Self { name, chain_id: chain.id() })
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(serde::de::Error::custom)
    }
}
