//! Call Batch Builder
//!
//! Emission order is fixed per request shape and must stay in step with
//! `decoder.rs`:
//!
//! Genesis balances, per pool in request order:
//!   1. `balanceOf(pool, genesis)`
//!   2. `balanceOf(pool, user)`        (user present)
//!   3. `userInfo(pid, user)`          (user present)
//!   4. `pendingReward(pid, user)`     (user present)
//!
//! Pair balance:
//!   1. `balanceOf(base, pair)`
//!   2. `balanceOf(quote, pair)`
//!   3. `balanceOf(pair, genesis)`
//!   4. `balanceOf(pair, user)`        (user present)
//!   5. `userInfo(pid, user)`          (user present)
//!   6. `pendingReward(pid, user)`     (user present)
//!   7. `balanceOf(base, user)`        (user present)
//!   8. `balanceOf(quote, user)`       (user present)

use alloy_primitives::U256;
use tracing::debug;

use super::{BatchContext, CallKind, CallSpec, CallTag};
use crate::abi::parse_decimal;
use crate::error::EncodeError;
use crate::request::{GenesisRequest, PairRequest};

pub const GENESIS_CALLS_PER_POOL: usize = 4;
pub const PAIR_CALLS: usize = 8;

/// Base-10 pool id. Anything else fails the whole batch.
pub fn parse_pool_id(pool_id: &str) -> Result<U256, EncodeError> {
    parse_decimal(pool_id).ok_or_else(|| EncodeError::InvalidPoolId(pool_id.to_string()))
}

pub fn build_genesis_batch(request: &GenesisRequest) -> Result<BatchContext, EncodeError> {
    let user_present = request.user_present();

    // Parse every pool id up front so a bad one never leaves a partial batch
    let pool_ids = request
        .pools
        .iter()
        .map(|pool| parse_pool_id(&pool.pool_id))
        .collect::<Result<Vec<_>, _>>()?;

    let per_pool = if user_present { GENESIS_CALLS_PER_POOL } else { 1 };
    let mut batch = BatchContext::with_capacity(request.pools.len() * per_pool);

    for (slot, (pool, pid)) in request.pools.iter().zip(pool_ids.iter()).enumerate() {
        batch.push(CallSpec::balance_of(
            pool.address,
            request.genesis,
            CallTag::new(CallKind::GenesisBalance, slot),
        ));

        if user_present {
            batch.push(CallSpec::balance_of(
                pool.address,
                request.user,
                CallTag::new(CallKind::UserBalance, slot),
            ));
            batch.push(CallSpec::pool_query(
                request.genesis,
                pid,
                request.user,
                CallTag::new(CallKind::UserInfo, slot),
            ));
            batch.push(CallSpec::pool_query(
                request.genesis,
                pid,
                request.user,
                CallTag::new(CallKind::PendingReward, slot),
            ));
        }
    }

    debug!(
        "Built genesis batch: {} pools, {} calls (user: {})",
        request.pools.len(),
        batch.len(),
        user_present
    );

    Ok(batch)
}

pub fn build_pair_batch(request: &PairRequest) -> Result<BatchContext, EncodeError> {
    let user_present = request.user_present();
    let pid = parse_pool_id(&request.pool_id)?;
    let tag = |kind| CallTag::new(kind, 0);

    let mut batch = BatchContext::with_capacity(PAIR_CALLS);

    batch.push(CallSpec::balance_of(request.base_token, request.pair, tag(CallKind::BaseReserve)));
    batch.push(CallSpec::balance_of(request.quote_token, request.pair, tag(CallKind::QuoteReserve)));
    batch.push(CallSpec::balance_of(request.pair, request.genesis, tag(CallKind::GenesisBalance)));

    if user_present {
        batch.push(CallSpec::balance_of(request.pair, request.user, tag(CallKind::UserBalance)));
        batch.push(CallSpec::pool_query(request.genesis, &pid, request.user, tag(CallKind::UserInfo)));
        batch.push(CallSpec::pool_query(
            request.genesis,
            &pid,
            request.user,
            tag(CallKind::PendingReward),
        ));
        batch.push(CallSpec::balance_of(request.base_token, request.user, tag(CallKind::UserBaseBalance)));
        batch.push(CallSpec::balance_of(request.quote_token, request.user, tag(CallKind::UserQuoteBalance)));
    }

    debug!("Built pair batch: {} calls (user: {})", batch.len(), user_present);

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{PoolParams, ZERO_SENTINEL};
    use alloy_primitives::Address;
    use std::str::FromStr;

    fn addr(s: &str) -> Address {
        Address::from_str(s).unwrap()
    }

    fn genesis_request(pools: usize, user: Address) -> GenesisRequest {
        GenesisRequest {
            chain_id: "146".to_string(),
            pools: (0..pools)
                .map(|i| PoolParams {
                    address: Address::with_last_byte(0xa0 + i as u8),
                    pool_id: i.to_string(),
                })
                .collect(),
            genesis: addr("0x9999999999999999999999999999999999999999"),
            user,
        }
    }

    fn pair_request(user: Address) -> PairRequest {
        PairRequest {
            chain_id: "146".to_string(),
            pair: addr("0xcccccccccccccccccccccccccccccccccccccccc"),
            base_token: addr("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            quote_token: addr("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            genesis: addr("0x9999999999999999999999999999999999999999"),
            pool_id: "7".to_string(),
            user,
        }
    }

    fn user() -> Address {
        addr("0x1111111111111111111111111111111111111111")
    }

    #[test]
    fn test_genesis_batch_sizes() {
        for pools in 1..=5 {
            let no_user = build_genesis_batch(&genesis_request(pools, ZERO_SENTINEL)).unwrap();
            assert_eq!(no_user.len(), pools);

            let with_user = build_genesis_batch(&genesis_request(pools, user())).unwrap();
            assert_eq!(with_user.len(), 4 * pools);
        }
    }

    #[test]
    fn test_genesis_batch_order() {
        let req = genesis_request(2, user());
        let batch = build_genesis_batch(&req).unwrap();

        let tags: Vec<CallTag> = batch.calls().iter().map(|c| c.tag).collect();
        assert_eq!(
            tags,
            vec![
                CallTag::new(CallKind::GenesisBalance, 0),
                CallTag::new(CallKind::UserBalance, 0),
                CallTag::new(CallKind::UserInfo, 0),
                CallTag::new(CallKind::PendingReward, 0),
                CallTag::new(CallKind::GenesisBalance, 1),
                CallTag::new(CallKind::UserBalance, 1),
                CallTag::new(CallKind::UserInfo, 1),
                CallTag::new(CallKind::PendingReward, 1),
            ]
        );

        // Targets: pool token for balances, genesis for pool queries
        let second_pool = batch.get(4).unwrap();
        assert_eq!(second_pool.target, req.pools[1].address);
        assert_eq!(second_pool.method, "balanceOf");
        let info = batch.get(6).unwrap();
        assert_eq!(info.target, req.genesis);
        assert_eq!(info.method, "userInfo");
        assert_eq!(info.params[0].value, "1");
    }

    #[test]
    fn test_genesis_batch_single_pool_no_user() {
        let req = genesis_request(1, ZERO_SENTINEL);
        let batch = build_genesis_batch(&req).unwrap();

        let call = batch.get(0).unwrap();
        assert_eq!(call.target, req.pools[0].address);
        assert_eq!(call.method, "balanceOf");
        assert_eq!(call.params[0].value, req.genesis.to_string());
    }

    #[test]
    fn test_malformed_pool_id_fails_whole_batch() {
        let mut req = genesis_request(3, user());
        req.pools[2].pool_id = "five".to_string();

        assert_eq!(
            build_genesis_batch(&req).unwrap_err(),
            EncodeError::InvalidPoolId("five".to_string())
        );

        // Separators, signs and blanks
        for bad in ["", "_", "__", "1_0", "1 0", "+7"] {
            req.pools[2].pool_id = bad.to_string();
            assert_eq!(
                build_genesis_batch(&req).unwrap_err(),
                EncodeError::InvalidPoolId(bad.to_string()),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_pool_id_strict_decimal() {
        assert_eq!(parse_pool_id("0").unwrap(), U256::ZERO);
        assert_eq!(parse_pool_id("10").unwrap(), U256::from(10u64));
        assert_eq!(parse_pool_id("007").unwrap(), U256::from(7u64));
        assert!(parse_pool_id("_").is_err());
        assert!(parse_pool_id("1_0").is_err());
    }

    #[test]
    fn test_large_pool_id() {
        let mut req = genesis_request(1, user());
        req.pools[0].pool_id = U256::MAX.to_string();

        let batch = build_genesis_batch(&req).unwrap();
        assert_eq!(batch.get(2).unwrap().params[0].value, U256::MAX.to_string());
    }

    #[test]
    fn test_pair_batch_sizes_and_order() {
        let batch = build_pair_batch(&pair_request(ZERO_SENTINEL)).unwrap();
        assert_eq!(batch.len(), 3);

        let req = pair_request(user());
        let batch = build_pair_batch(&req).unwrap();
        assert_eq!(batch.len(), 8);

        let kinds: Vec<CallKind> = batch.calls().iter().map(|c| c.tag.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CallKind::BaseReserve,
                CallKind::QuoteReserve,
                CallKind::GenesisBalance,
                CallKind::UserBalance,
                CallKind::UserInfo,
                CallKind::PendingReward,
                CallKind::UserBaseBalance,
                CallKind::UserQuoteBalance,
            ]
        );

        assert_eq!(batch.get(0).unwrap().target, req.base_token);
        assert_eq!(batch.get(0).unwrap().params[0].value, req.pair.to_string());
        assert_eq!(batch.get(2).unwrap().target, req.pair);
        assert_eq!(batch.get(7).unwrap().target, req.quote_token);
    }

    #[test]
    fn test_pair_batch_bad_pool_id() {
        let mut req = pair_request(user());
        req.pool_id = "-1".to_string();
        assert!(matches!(build_pair_batch(&req), Err(EncodeError::InvalidPoolId(_))));
    }
}
