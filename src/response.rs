//! Response records
//!
//! Every on-chain integer is carried as a decimal string so full 256-bit
//! values survive JSON untouched. Fields that were not fetched hold the
//! literal string `"null"`.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

pub const NULL_FIELD: &str = "null";

pub const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

impl Default for VersionResponse {
    fn default() -> Self {
        Self {
            version: VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenesisBalance {
    pub token: String,
    pub pool_id: String,
    /// Pool token held by the genesis contract
    pub genesis_balance: String,
    pub user_balance: String,
    /// `amount` from `userInfo`
    pub user_stake: String,
    /// `pendingReward`
    pub user_reward: String,
}

impl GenesisBalance {
    pub fn new(token: &Address, pool_id: &str) -> Self {
        Self {
            token: token.to_string(),
            pool_id: pool_id.to_string(),
            genesis_balance: NULL_FIELD.to_string(),
            user_balance: NULL_FIELD.to_string(),
            user_stake: NULL_FIELD.to_string(),
            user_reward: NULL_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisResponse {
    pub pools: Vec<GenesisBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PairBalance {
    pub pair: String,
    pub pool_id: String,
    pub base_reserve: String,
    pub quote_reserve: String,
    /// LP tokens staked in genesis
    pub genesis_balance: String,
    pub user_balance: String,
    pub user_stake: String,
    pub user_reward: String,
    pub user_base_balance: String,
    pub user_quote_balance: String,
}

impl PairBalance {
    pub fn new(pair: &Address, pool_id: &str) -> Self {
        let null = || NULL_FIELD.to_string();
        Self {
            pair: pair.to_string(),
            pool_id: pool_id.to_string(),
            base_reserve: null(),
            quote_reserve: null(),
            genesis_balance: null(),
            user_balance: null(),
            user_stake: null(),
            user_reward: null(),
            user_base_balance: null(),
            user_quote_balance: null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResponse {
    pub pair: PairBalance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_balance_json_names() {
        let balance = GenesisBalance::new(&Address::ZERO, "5");
        let json = serde_json::to_value(&balance).unwrap();

        assert_eq!(json["pool-id"], "5");
        assert_eq!(json["genesis-balance"], "null");
        assert_eq!(json["user-reward"], "null");
        assert_eq!(json["token"], "0x0000000000000000000000000000000000000000");
    }

    #[test]
    fn test_version() {
        assert!(VersionResponse::default().version.starts_with("genesis-info v"));
    }
}
