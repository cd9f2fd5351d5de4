//! Genesis Info
//!
//! Reads genesis-pool and liquidity-pair balances for a user in a single
//! multicall round trip against a randomly chosen, failover-protected RPC
//! endpoint.

pub mod abi;
pub mod api;
pub mod chains;
pub mod config;
pub mod error;
pub mod multicall;
pub mod request;
pub mod response;
pub mod rpc;
pub mod service;

pub use chains::{ChainInfo, ChainRegistry};
pub use error::{InfoError, Result};
pub use multicall::SubcallFailurePolicy;
pub use request::{GenesisRequest, PairRequest};
pub use response::{GenesisResponse, PairResponse};
pub use rpc::{HttpDialer, RpcSelector};
pub use service::InfoService;
