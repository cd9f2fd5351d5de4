//! Multicall batching
//!
//! One request becomes one `multicallView` eth_call:
//! - `builder` emits an ordered [`BatchContext`] for a request shape
//! - `invoker` packs it into the aggregator call and unpacks the outcomes
//! - `decoder` walks outcomes and batch in lockstep into response records
//!
//! The wire protocol pairs calls and results by position only. Each
//! [`CallSpec`] also carries a [`CallTag`] so the decoder can prove it is
//! reading the slot it thinks it is.

mod builder;
mod decoder;
mod invoker;

pub use builder::{build_genesis_batch, build_pair_batch, parse_pool_id};
pub use decoder::{decode_genesis_batch, decode_pair_batch, SubcallFailurePolicy};
pub use invoker::{invoke, ReadTransport};

#[cfg(test)]
pub(crate) use invoker::testing;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::sol;
use std::fmt;

use crate::abi::{encode_call, ParameterDescriptor};
use crate::error::EncodeError;

// ============================================
// CONTRACT INTERFACES
// ============================================

sol! {
    /// Read-only aggregator deployed per chain
    interface IMulticallView {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function multicallView(Call[] calldata calls)
            external view returns (Result[] memory returnData);
    }
}

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }

    interface IGenesisPool {
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
        function pendingReward(uint256 pid, address user) external view returns (uint256);
    }
}

// ============================================
// TYPES
// ============================================

/// What a call in the batch is for. Fixes both the method and how its
/// return data is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Pool/LP token held by the genesis contract
    GenesisBalance,
    /// Pool/LP token held by the user
    UserBalance,
    UserInfo,
    PendingReward,
    /// Base token held by the pair
    BaseReserve,
    /// Quote token held by the pair
    QuoteReserve,
    UserBaseBalance,
    UserQuoteBalance,
}

impl CallKind {
    pub fn method(&self) -> &'static str {
        match self {
            CallKind::UserInfo => "userInfo",
            CallKind::PendingReward => "pendingReward",
            _ => "balanceOf",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::GenesisBalance => "genesis-balance",
            CallKind::UserBalance => "user-balance",
            CallKind::UserInfo => "user-info",
            CallKind::PendingReward => "pending-reward",
            CallKind::BaseReserve => "base-reserve",
            CallKind::QuoteReserve => "quote-reserve",
            CallKind::UserBaseBalance => "user-base-balance",
            CallKind::UserQuoteBalance => "user-quote-balance",
        };
        f.write_str(name)
    }
}

/// Correlates a batch position with the logical slot it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallTag {
    pub kind: CallKind,
    /// Pool index within the request (always 0 for a pair)
    pub slot: usize,
}

impl CallTag {
    pub fn new(kind: CallKind, slot: usize) -> Self {
        Self { kind, slot }
    }
}

impl fmt::Display for CallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    pub target: Address,
    pub method: &'static str,
    pub params: Vec<ParameterDescriptor>,
    pub tag: CallTag,
}

impl CallSpec {
    /// `token.balanceOf(holder)`
    pub fn balance_of(token: Address, holder: Address, tag: CallTag) -> Self {
        Self {
            target: token,
            method: CallKind::GenesisBalance.method(),
            params: vec![ParameterDescriptor::address(&holder)],
            tag,
        }
    }

    /// `genesis.userInfo(pid, user)` or `genesis.pendingReward(pid, user)`
    pub fn pool_query(genesis: Address, pool_id: &U256, user: Address, tag: CallTag) -> Self {
        Self {
            target: genesis,
            method: tag.kind.method(),
            params: vec![
                ParameterDescriptor::uint256(pool_id.to_string()),
                ParameterDescriptor::address(&user),
            ],
            tag,
        }
    }

    /// Wire form for the aggregator
    pub fn encode(&self) -> Result<IMulticallView::Call, EncodeError> {
        Ok(IMulticallView::Call {
            target: self.target,
            callData: encode_call(self.method, &self.params)?,
        })
    }
}

/// Ordered calls for one request. Built once, read by invoker and decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchContext {
    calls: Vec<CallSpec>,
}

impl BatchContext {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            calls: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, call: CallSpec) {
        self.calls.push(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn calls(&self) -> &[CallSpec] {
        &self.calls
    }

    pub fn get(&self, index: usize) -> Option<&CallSpec> {
        self.calls.get(index)
    }

    pub fn encode(&self) -> Result<Vec<IMulticallView::Call>, EncodeError> {
        self.calls.iter().map(CallSpec::encode).collect()
    }
}

/// Outcome of one sub-call, at the same index as its [`CallSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallResult {
    pub success: bool,
    pub return_data: Bytes,
}

impl From<IMulticallView::Result> for MulticallResult {
    fn from(r: IMulticallView::Result) -> Self {
        Self {
            success: r.success,
            return_data: r.returnData,
        }
    }
}
