//! Result Decoder
//!
//! Walks the batch and the multicall outcomes with one shared cursor. The
//! cursor advances exactly as the builder emitted, checks each position's
//! tag against the slot being filled, and never indexes past the results.

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::{BatchContext, CallKind, CallTag, IGenesisPool, IERC20, MulticallResult};
use crate::error::DecodeError;
use crate::request::{GenesisRequest, PairRequest};
use crate::response::{GenesisBalance, GenesisResponse, PairBalance, PairResponse, NULL_FIELD};

/// What to do with a sub-call the aggregator reports as reverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubcallFailurePolicy {
    /// Leave the fields it feeds as `"null"`
    #[default]
    Null,
    /// Fail the whole request
    Abort,
}

impl FromStr for SubcallFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "null" => Ok(SubcallFailurePolicy::Null),
            "abort" => Ok(SubcallFailurePolicy::Abort),
            other => Err(format!("unknown sub-call failure policy: {other}")),
        }
    }
}

impl fmt::Display for SubcallFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubcallFailurePolicy::Null => write!(f, "null"),
            SubcallFailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

struct ResultCursor<'a> {
    batch: &'a BatchContext,
    results: &'a [MulticallResult],
    policy: SubcallFailurePolicy,
    pos: usize,
}

impl<'a> ResultCursor<'a> {
    fn new(
        batch: &'a BatchContext,
        results: &'a [MulticallResult],
        policy: SubcallFailurePolicy,
    ) -> Result<Self, DecodeError> {
        if batch.len() != results.len() {
            return Err(DecodeError::ResultCountMismatch {
                expected: batch.len(),
                actual: results.len(),
            });
        }
        Ok(Self {
            batch,
            results,
            policy,
            pos: 0,
        })
    }

    /// Return data at the cursor, or `None` for a reverted sub-call under
    /// the `Null` policy.
    fn next(&mut self, expected: CallTag) -> Result<Option<&'a [u8]>, DecodeError> {
        let index = self.pos;
        let (Some(call), Some(result)) = (self.batch.get(index), self.results.get(index)) else {
            return Err(DecodeError::OutOfBounds {
                index,
                len: self.results.len(),
            });
        };

        if call.tag != expected {
            return Err(DecodeError::TagMismatch {
                index,
                expected: expected.to_string(),
                actual: call.tag.to_string(),
            });
        }
        self.pos += 1;

        if result.success {
            return Ok(Some(result.return_data.as_ref()));
        }
        match self.policy {
            SubcallFailurePolicy::Null => {
                warn!("Sub-call {} ({}) reverted, leaving null", index, expected);
                Ok(None)
            }
            SubcallFailurePolicy::Abort => Err(DecodeError::SubcallFailed {
                method: expected.kind.method(),
                index,
            }),
        }
    }

    /// A bare `uint256` as a decimal string
    fn next_uint(&mut self, expected: CallTag) -> Result<String, DecodeError> {
        let Some(data) = self.next(expected)? else {
            return Ok(NULL_FIELD.to_string());
        };

        let value = match expected.kind {
            CallKind::PendingReward => IGenesisPool::pendingRewardCall::abi_decode_returns(data),
            _ => IERC20::balanceOfCall::abi_decode_returns(data),
        }
        .map_err(|e| unpack_error(expected, e))?;

        Ok(decimal(value))
    }

    /// `userInfo` -> staked `amount`
    fn next_stake(&mut self, expected: CallTag) -> Result<String, DecodeError> {
        let Some(data) = self.next(expected)? else {
            return Ok(NULL_FIELD.to_string());
        };

        let info = IGenesisPool::userInfoCall::abi_decode_returns(data)
            .map_err(|e| unpack_error(expected, e))?;

        Ok(decimal(info.amount))
    }

    /// Every result must have been consumed.
    fn finish(self) -> Result<(), DecodeError> {
        if self.pos != self.results.len() {
            return Err(DecodeError::ResultCountMismatch {
                expected: self.pos,
                actual: self.results.len(),
            });
        }
        Ok(())
    }
}

fn unpack_error(tag: CallTag, err: alloy_sol_types::Error) -> DecodeError {
    DecodeError::Unpack {
        method: tag.kind.method(),
        cause: format!("{tag}: {err}"),
    }
}

fn decimal(value: U256) -> String {
    value.to_string()
}

pub fn decode_genesis_batch(
    batch: &BatchContext,
    results: &[MulticallResult],
    request: &GenesisRequest,
    policy: SubcallFailurePolicy,
) -> Result<GenesisResponse, DecodeError> {
    let user_present = request.user_present();
    let mut cursor = ResultCursor::new(batch, results, policy)?;
    let mut pools = Vec::with_capacity(request.pools.len());

    for (slot, pool) in request.pools.iter().enumerate() {
        let tag = |kind| CallTag::new(kind, slot);
        let mut balance = GenesisBalance::new(&pool.address, &pool.pool_id);

        balance.genesis_balance = cursor.next_uint(tag(CallKind::GenesisBalance))?;
        if user_present {
            balance.user_balance = cursor.next_uint(tag(CallKind::UserBalance))?;
            balance.user_stake = cursor.next_stake(tag(CallKind::UserInfo))?;
            balance.user_reward = cursor.next_uint(tag(CallKind::PendingReward))?;
        }

        pools.push(balance);
    }

    cursor.finish()?;
    Ok(GenesisResponse { pools })
}

pub fn decode_pair_batch(
    batch: &BatchContext,
    results: &[MulticallResult],
    request: &PairRequest,
    policy: SubcallFailurePolicy,
) -> Result<PairResponse, DecodeError> {
    let user_present = request.user_present();
    let mut cursor = ResultCursor::new(batch, results, policy)?;
    let tag = |kind| CallTag::new(kind, 0);
    let mut pair = PairBalance::new(&request.pair, &request.pool_id);

    pair.base_reserve = cursor.next_uint(tag(CallKind::BaseReserve))?;
    pair.quote_reserve = cursor.next_uint(tag(CallKind::QuoteReserve))?;
    pair.genesis_balance = cursor.next_uint(tag(CallKind::GenesisBalance))?;

    if user_present {
        pair.user_balance = cursor.next_uint(tag(CallKind::UserBalance))?;
        pair.user_stake = cursor.next_stake(tag(CallKind::UserInfo))?;
        pair.user_reward = cursor.next_uint(tag(CallKind::PendingReward))?;
        pair.user_base_balance = cursor.next_uint(tag(CallKind::UserBaseBalance))?;
        pair.user_quote_balance = cursor.next_uint(tag(CallKind::UserQuoteBalance))?;
    }

    cursor.finish()?;
    Ok(PairResponse { pair })
}
