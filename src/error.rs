//! Error taxonomy for the balance pipeline
//!
//! Every stage of a request (config lookup, dial, encode, invoke, decode)
//! has its own error family. Nothing here is retried: endpoint failover
//! inside the RPC selector is the only recovery, everything else aborts
//! the request as a whole.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, InfoError>;

/// Top-level error returned by the core pipeline.
#[derive(Debug, Error)]
pub enum InfoError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("all {attempted} RPC endpoints failed for chain {chain_id}")]
    Dial {
        chain_id: String,
        attempted: usize,
        #[source]
        last: BoxError,
    },

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("multicall invoke failed: {0}")]
    Invoke(#[from] InvokeError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl InfoError {
    /// Machine-readable kind, safe to hand to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            InfoError::Config(_) => "config_error",
            InfoError::Dial { .. } => "dial_error",
            InfoError::Encode(_) => "encode_error",
            InfoError::Invoke(_) => "invoke_error",
            InfoError::Decode(_) => "decode_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chain ID {0} not supported")]
    UnknownChain(String),

    #[error("multicall address could not be found for {0}")]
    MissingMulticall(String),

    #[error("chain {0} has no RPC endpoints")]
    NoEndpoints(String),

    #[error("invalid endpoint {url} for chain {chain_id}: {reason}")]
    InvalidEndpoint {
        chain_id: String,
        url: String,
        reason: String,
    },

    #[error("failed to load chain table: {0}")]
    ChainTable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unsupported parameter type: {0}")]
    InvalidParameterType(String),

    #[error("invalid {abi_type} value {value:?}: {reason}")]
    InvalidParameterValue {
        abi_type: String,
        value: String,
        reason: String,
    },

    #[error("pool id {0:?} is not a base-10 integer")]
    InvalidPoolId(String),
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("eth_call to multicall contract failed: {0}")]
    Transport(#[source] BoxError),

    #[error("failed to unpack multicallView result: {0}")]
    Unpack(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to unpack {method}: {cause}")]
    Unpack { method: &'static str, cause: String },

    #[error("multicall returned {actual} results for a batch of {expected}")]
    ResultCountMismatch { expected: usize, actual: usize },

    #[error("result cursor {index} is past the end of {len} results")]
    OutOfBounds { index: usize, len: usize },

    #[error("call {index} is tagged {actual}, decoder expected {expected}")]
    TagMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("sub-call {index} ({method}) reverted")]
    SubcallFailed { method: &'static str, index: usize },
}
