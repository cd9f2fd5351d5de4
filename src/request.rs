//! Typed request parameters
//!
//! Query strings are parsed by hand, one function per request shape, into
//! structs the core can trust: addresses are already 20-byte values and
//! the user falls back to the zero sentinel. Pool ids stay textual because
//! parsing them is the batch builder's job.

use alloy_primitives::Address;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// "No user supplied"
pub const ZERO_SENTINEL: Address = Address::ZERO;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("mismatched pool addresses ({addresses}) and pids ({pids})")]
    MismatchedPools { addresses: usize, pids: usize },

    #[error("at least one pool is required")]
    NoPools,

    #[error("Invalid query parameter")]
    UnknownQuery,
}

/// Raw `(key, value)` pairs in arrival order; keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl QueryPairs {
    /// First non-empty value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl From<Vec<(String, String)>> for QueryPairs {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub address: Address,
    pub pool_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisRequest {
    pub chain_id: String,
    pub pools: Vec<PoolParams>,
    pub genesis: Address,
    pub user: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRequest {
    pub chain_id: String,
    /// Pair contract; also the LP token staked in genesis
    pub pair: Address,
    pub base_token: Address,
    pub quote_token: Address,
    pub genesis: Address,
    pub pool_id: String,
    pub user: Address,
}

fn require<'a>(
    query: &'a QueryPairs,
    key: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<&'a str> {
    let value = query.get(key);
    if value.is_none() {
        missing.push(key);
    }
    value
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, RequestError> {
    Address::from_str(value).map_err(|_| RequestError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

/// `0x` + 40 hex digits, or the zero sentinel when absent.
fn parse_user(query: &QueryPairs) -> Result<Address, RequestError> {
    let Some(user) = query.get("user") else {
        return Ok(ZERO_SENTINEL);
    };

    let well_formed = user.len() == 42
        && user.starts_with("0x")
        && user[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(RequestError::InvalidAddress {
            field: "user",
            value: user.to_string(),
        });
    }
    parse_address("user", user)
}

impl GenesisRequest {
    /// Parse `chain-id`, `genesis`, optional `user`, and the repeated
    /// `pools.address` / `pools.pid` keys (paired by position).
    pub fn from_query(query: &QueryPairs) -> Result<Self, RequestError> {
        let mut missing = Vec::new();
        let chain_id = require(query, "chain-id", &mut missing);
        let genesis = require(query, "genesis", &mut missing);
        let (Some(chain_id), Some(genesis)) = (chain_id, genesis) else {
            return Err(RequestError::MissingFields(missing));
        };

        let user = parse_user(query)?;
        let genesis = parse_address("genesis", genesis)?;

        let addresses = query.all("pools.address");
        let pids = query.all("pools.pid");
        if addresses.len() != pids.len() {
            return Err(RequestError::MismatchedPools {
                addresses: addresses.len(),
                pids: pids.len(),
            });
        }
        if addresses.is_empty() {
            return Err(RequestError::NoPools);
        }

        let pools = addresses
            .iter()
            .zip(pids.iter())
            .map(|(address, pid)| {
                Ok(PoolParams {
                    address: parse_address("pool", address)?,
                    pool_id: pid.to_string(),
                })
            })
            .collect::<Result<Vec<_>, RequestError>>()?;

        Ok(Self {
            chain_id: chain_id.to_string(),
            pools,
            genesis,
            user,
        })
    }

    pub fn user_present(&self) -> bool {
        self.user != ZERO_SENTINEL
    }

    pub fn log_summary(&self) {
        debug!("Chain ID:        {}", self.chain_id);
        debug!("Genesis Address: {}", self.genesis);
        debug!("User Address:    {}", self.user);
        for (i, pool) in self.pools.iter().enumerate() {
            debug!("  [{}] Address: {}  PID: {}", i, pool.address, pool.pool_id);
        }
    }
}

impl PairRequest {
    pub fn from_query(query: &QueryPairs) -> Result<Self, RequestError> {
        let mut missing = Vec::new();
        let chain_id = require(query, "chain-id", &mut missing);
        let genesis = require(query, "genesis", &mut missing);
        let pool_id = require(query, "pid", &mut missing);
        let pair = require(query, "pair", &mut missing);
        let base = require(query, "base", &mut missing);
        let quote = require(query, "quote", &mut missing);

        let (Some(chain_id), Some(genesis), Some(pool_id), Some(pair), Some(base), Some(quote)) =
            (chain_id, genesis, pool_id, pair, base, quote)
        else {
            return Err(RequestError::MissingFields(missing));
        };

        Ok(Self {
            chain_id: chain_id.to_string(),
            pair: parse_address("pair", pair)?,
            base_token: parse_address("base", base)?,
            quote_token: parse_address("quote", quote)?,
            genesis: parse_address("genesis", genesis)?,
            pool_id: pool_id.to_string(),
            user: parse_user(query)?,
        })
    }

    pub fn user_present(&self) -> bool {
        self.user != ZERO_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const POOL_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const GENESIS: &str = "0x9999999999999999999999999999999999999999";
    const USER: &str = "0x1111111111111111111111111111111111111111";

    fn query(pairs: &[(&str, &str)]) -> QueryPairs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_genesis_request_without_user() {
        let q = query(&[
            ("query", "get-genesis-balances"),
            ("chain-id", "146"),
            ("genesis", GENESIS),
            ("pools.address", POOL_A),
            ("pools.pid", "0"),
            ("pools.address", POOL_B),
            ("pools.pid", "1"),
        ]);

        let req = GenesisRequest::from_query(&q).unwrap();
        assert_eq!(req.chain_id, "146");
        assert_eq!(req.pools.len(), 2);
        assert_eq!(req.pools[1].address, Address::from_str(POOL_B).unwrap());
        assert_eq!(req.pools[1].pool_id, "1");
        assert_eq!(req.user, ZERO_SENTINEL);
        assert!(!req.user_present());
    }

    #[test]
    fn test_genesis_request_with_user() {
        let q = query(&[
            ("chain-id", "146"),
            ("genesis", GENESIS),
            ("user", USER),
            ("pools.address", POOL_A),
            ("pools.pid", "3"),
        ]);
        let req = GenesisRequest::from_query(&q).unwrap();
        assert!(req.user_present());
    }

    #[test]
    fn test_missing_fields_listed() {
        let q = query(&[("pools.address", POOL_A), ("pools.pid", "0")]);
        let err = GenesisRequest::from_query(&q).unwrap_err();
        assert_eq!(err, RequestError::MissingFields(vec!["chain-id", "genesis"]));
        assert_eq!(err.to_string(), "Missing fields: chain-id, genesis");
    }

    #[test]
    fn test_mismatched_pools() {
        let q = query(&[
            ("chain-id", "146"),
            ("genesis", GENESIS),
            ("pools.address", POOL_A),
            ("pools.address", POOL_B),
            ("pools.pid", "0"),
        ]);
        assert_eq!(
            GenesisRequest::from_query(&q).unwrap_err(),
            RequestError::MismatchedPools { addresses: 2, pids: 1 }
        );
    }

    #[test]
    fn test_no_pools() {
        let q = query(&[("chain-id", "146"), ("genesis", GENESIS)]);
        assert_eq!(GenesisRequest::from_query(&q).unwrap_err(), RequestError::NoPools);
    }

    #[test]
    fn test_bad_user_rejected() {
        for bad in ["0x1234", "1111111111111111111111111111111111111111", "0xZZ11111111111111111111111111111111111111"] {
            let q = query(&[
                ("chain-id", "146"),
                ("genesis", GENESIS),
                ("user", bad),
                ("pools.address", POOL_A),
                ("pools.pid", "0"),
            ]);
            assert!(
                matches!(
                    GenesisRequest::from_query(&q),
                    Err(RequestError::InvalidAddress { field: "user", .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_pool_id_kept_as_text() {
        let q = query(&[
            ("chain-id", "146"),
            ("genesis", GENESIS),
            ("pools.address", POOL_A),
            ("pools.pid", "not-a-number"),
        ]);
        let req = GenesisRequest::from_query(&q).unwrap();
        assert_eq!(req.pools[0].pool_id, "not-a-number");
    }

    #[test]
    fn test_pair_request() {
        let q = query(&[
            ("chain-id", "146"),
            ("genesis", GENESIS),
            ("pid", "2"),
            ("pair", POOL_A),
            ("base", POOL_B),
            ("quote", USER),
        ]);
        let req = PairRequest::from_query(&q).unwrap();
        assert_eq!(req.pool_id, "2");
        assert_eq!(req.quote_token, Address::from_str(USER).unwrap());
        assert!(!req.user_present());

        let q = query(&[("chain-id", "146"), ("pair", POOL_A)]);
        assert_eq!(
            PairRequest::from_query(&q).unwrap_err(),
            RequestError::MissingFields(vec!["genesis", "pid", "base", "quote"])
        );
    }
}
