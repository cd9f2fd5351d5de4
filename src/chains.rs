//! Chain Registry
//!
//! Static mapping from the chain identifier a client sends (`"146"`,
//! `"0x92"`, ...) to the redundant RPC endpoints and the deployed
//! multicall aggregator for that chain. Built once at startup and then
//! only read, so it is shared behind an `Arc` without locking.

use alloy_primitives::{address, Address};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

// ============================================
// CONSTANTS
// ============================================

/// MulticallView aggregator on Sonic
pub const SONIC_MULTICALL: Address = address!("d782fF720cbB9c8337e02013eE3ccBb54B5471D9");

const SONIC_RPCS: &[&str] = &[
    "https://rpc.soniclabs.com",
    "https://sonic.drpc.org",
    "https://sonic-rpc.publicnode.com",
    "https://rpc.ankr.com/sonic_mainnet",
    "https://sonic.api.onfinality.io/public",
];

// ============================================
// TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Numeric EVM chain id, used to sanity-check endpoints
    pub id: u64,
    pub name: String,
    /// Interchangeable endpoints, tried in random order
    pub rpc: Vec<String>,
    pub multicall: Address,
}

/// Immutable lookup table from client-facing chain key to [`ChainInfo`].
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainInfo>,
}

/// On-disk chain table layout
#[derive(Debug, Deserialize)]
struct ChainTable {
    chains: Vec<ChainEntry>,
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    /// Every key that should resolve to this chain (decimal and hex aliases)
    keys: Vec<String>,
    id: u64,
    name: String,
    rpc: Vec<String>,
    multicall: String,
}

impl ChainRegistry {
    /// The chains this service ships with.
    pub fn builtin() -> Self {
        let sonic = ChainInfo {
            id: 146,
            name: "Sonic Mainnet".to_string(),
            rpc: SONIC_RPCS.iter().map(|s| s.to_string()).collect(),
            multicall: SONIC_MULTICALL,
        };

        let mut registry = Self::default();
        registry.insert("146", sonic.clone());
        registry.insert("0x92", sonic);
        registry
    }

    /// Load a chain table from a TOML file, replacing the built-in table.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ChainTable(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let table: ChainTable =
            toml::from_str(content).map_err(|e| ConfigError::ChainTable(e.to_string()))?;

        let mut registry = Self::default();
        for entry in table.chains {
            let multicall = Address::from_str(&entry.multicall).map_err(|_| {
                ConfigError::MissingMulticall(format!("{} ({})", entry.name, entry.multicall))
            })?;
            let info = ChainInfo {
                id: entry.id,
                name: entry.name,
                rpc: entry.rpc,
                multicall,
            };
            for key in entry.keys {
                registry.insert(&key, info.clone());
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, key: &str, info: ChainInfo) {
        self.chains.insert(key.to_string(), info);
    }

    pub fn lookup(&self, chain_id: &str) -> Result<&ChainInfo, ConfigError> {
        self.chains
            .get(chain_id)
            .ok_or_else(|| ConfigError::UnknownChain(chain_id.to_string()))
    }

    pub fn multicall_address(&self, chain_id: &str) -> Result<Address, ConfigError> {
        let chain = self.lookup(chain_id)?;
        if chain.multicall == Address::ZERO {
            return Err(ConfigError::MissingMulticall(chain_id.to_string()));
        }
        Ok(chain.multicall)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Sorted chain keys, for the startup summary
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Every chain needs at least one endpoint and every endpoint must be a URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, chain) in &self.chains {
            if chain.rpc.is_empty() {
                return Err(ConfigError::NoEndpoints(key.clone()));
            }
            for rpc in &chain.rpc {
                Url::parse(rpc).map_err(|e| ConfigError::InvalidEndpoint {
                    chain_id: key.clone(),
                    url: rpc.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}
