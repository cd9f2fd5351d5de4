//! ABI Method Encoder
//!
//! Turns a method name plus textual parameter descriptors into calldata:
//! `keccak256("name(type1,type2)")[..4] ++ abi_encode(params)`.
//!
//! Parameter types are only known at runtime here, so packing goes through
//! `alloy_dyn_abi` instead of `sol!`-generated call structs.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, Address, Bytes, U256};
use std::fmt;
use std::str::FromStr;

use crate::error::EncodeError;

/// The parameter types the encoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Uint256,
    Address,
    Bytes,
    Bool,
    String,
}

impl AbiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiType::Uint256 => "uint256",
            AbiType::Address => "address",
            AbiType::Bytes => "bytes",
            AbiType::Bool => "bool",
            AbiType::String => "string",
        }
    }

    pub fn dyn_type(&self) -> DynSolType {
        match self {
            AbiType::Uint256 => DynSolType::Uint(256),
            AbiType::Address => DynSolType::Address,
            AbiType::Bytes => DynSolType::Bytes,
            AbiType::Bool => DynSolType::Bool,
            AbiType::String => DynSolType::String,
        }
    }
}

impl FromStr for AbiType {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint256" => Ok(AbiType::Uint256),
            "address" => Ok(AbiType::Address),
            "bytes" => Ok(AbiType::Bytes),
            "bool" => Ok(AbiType::Bool),
            "string" => Ok(AbiType::String),
            other => Err(EncodeError::InvalidParameterType(other.to_string())),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One method argument as text, tagged with its ABI type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub abi_type: String,
    pub value: String,
}

impl ParameterDescriptor {
    pub fn new(abi_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            abi_type: abi_type.into(),
            value: value.into(),
        }
    }

    pub fn uint256(value: impl Into<String>) -> Self {
        Self::new(AbiType::Uint256.as_str(), value)
    }

    pub fn address(address: &Address) -> Self {
        Self::new(AbiType::Address.as_str(), address.to_string())
    }

    /// Parse the text value according to the declared type.
    pub fn to_value(&self) -> Result<DynSolValue, EncodeError> {
        let abi_type = AbiType::from_str(&self.abi_type)?;
        let invalid = |reason: &str| EncodeError::InvalidParameterValue {
            abi_type: self.abi_type.clone(),
            value: self.value.clone(),
            reason: reason.to_string(),
        };

        let value = match abi_type {
            AbiType::Uint256 => {
                let n = parse_decimal(&self.value).ok_or_else(|| invalid("not a base-10 uint256"))?;
                DynSolValue::Uint(n, 256)
            }
            AbiType::Address => {
                let addr = Address::from_str(&self.value)
                    .map_err(|e| invalid(&e.to_string()))?;
                DynSolValue::Address(addr)
            }
            AbiType::Bytes => {
                let hex_body = self
                    .value
                    .strip_prefix("0x")
                    .ok_or_else(|| invalid("bytes value must start with 0x"))?;
                let data = hex::decode(hex_body).map_err(|e| invalid(&e.to_string()))?;
                DynSolValue::Bytes(data)
            }
            AbiType::Bool => DynSolValue::Bool(self.value == "true"),
            AbiType::String => DynSolValue::String(self.value.clone()),
        };

        Ok(value)
    }
}

/// Strict base-10 `uint256`: one or more ASCII digits, no sign, prefix
/// or `_` separators.
pub fn parse_decimal(value: &str) -> Option<U256> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(value, 10).ok()
}

/// Canonical signature, e.g. `userInfo(uint256,address)`.
pub fn method_signature(method: &str, params: &[ParameterDescriptor]) -> String {
    let types: Vec<&str> = params.iter().map(|p| p.abi_type.as_str()).collect();
    format!("{}({})", method, types.join(","))
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build calldata for `method` called with `params`.
pub fn encode_call(method: &str, params: &[ParameterDescriptor]) -> Result<Bytes, EncodeError> {
    let values = params
        .iter()
        .map(ParameterDescriptor::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let signature = method_signature(method, params);
    let packed = DynSolValue::Tuple(values).abi_encode_params();

    let mut calldata = Vec::with_capacity(4 + packed.len());
    calldata.extend_from_slice(&selector(&signature));
    calldata.extend_from_slice(&packed);

    Ok(calldata.into())
}
