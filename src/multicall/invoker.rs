//! Multicall Invoker
//!
//! Packs a [`BatchContext`] into one `multicallView(Call[])` eth_call and
//! unpacks the `(success, returnData)[]` reply in submitted order.
//! Failed sub-calls are passed through untouched; the decoder applies
//! the failure policy.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

use super::{BatchContext, IMulticallView, MulticallResult};
use crate::error::{BoxError, InfoError, InvokeError};

/// Read-only contract access: one eth_call against the latest block.
pub trait ReadTransport {
    fn call(&self, to: Address, calldata: Bytes) -> impl Future<Output = Result<Bytes, BoxError>> + Send;
}

pub async fn invoke<T>(
    transport: &T,
    multicall: Address,
    batch: &BatchContext,
) -> Result<Vec<MulticallResult>, InfoError>
where
    T: ReadTransport + Sync,
{
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let calls = batch.encode()?;
    let calldata = IMulticallView::multicallViewCall { calls }.abi_encode();

    let start = Instant::now();
    let reply = transport
        .call(multicall, calldata.into())
        .await
        .map_err(InvokeError::Transport)?;

    let decoded = IMulticallView::multicallViewCall::abi_decode_returns(&reply)
        .map_err(|e| InvokeError::Unpack(e.to_string()))?;

    debug!(
        "multicallView: {} calls -> {} results in {:?}",
        batch.len(),
        decoded.len(),
        start.elapsed()
    );

    Ok(decoded.into_iter().map(MulticallResult::from).collect())
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::multicall::{CallKind, CallSpec, CallTag};
    use alloy_primitives::U256;
    use std::str::FromStr;
    use std::sync::atomic::Ordering;

    fn two_call_batch() -> BatchContext {
        let token = Address::from_str("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        let mut batch = BatchContext::default();
        batch.push(CallSpec::balance_of(token, Address::with_last_byte(1), CallTag::new(CallKind::GenesisBalance, 0)));
        batch.push(CallSpec::balance_of(token, Address::with_last_byte(2), CallTag::new(CallKind::UserBalance, 0)));
        batch
    }

    #[tokio::test]
    async fn test_invoke_preserves_order_and_failures() {
        let chain = FakeChain::replying(&[
            (true, uint(U256::from(1000u64))),
            (false, vec![]),
        ]);
        let multicall = Address::with_last_byte(0x42);
        let batch = two_call_batch();

        let results = invoke(&chain, multicall, &batch).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert_eq!(results[0].return_data.to_vec(), uint(U256::from(1000u64)));
        assert!(!results[1].success, "failed sub-calls are passed through");

        let seen = chain.last_request.lock().unwrap().take().unwrap();
        assert_eq!(seen.0, multicall);
        assert_eq!(seen.1.len(), 2);
        assert_eq!(seen.1[0].callData, batch.get(0).unwrap().encode().unwrap().callData);
        assert_eq!(seen.1[1].callData, batch.get(1).unwrap().encode().unwrap().callData);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let chain = FakeChain::replying(&[]);
        let results = invoke(&chain, Address::ZERO, &BatchContext::default()).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(chain.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let chain = FakeChain::failing("connection reset");
        let err = invoke(&chain, Address::ZERO, &two_call_batch()).await.unwrap_err();
        assert!(matches!(err, InfoError::Invoke(InvokeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_garbage_reply() {
        let chain = FakeChain::raw(vec![0xde, 0xad]);
        let err = invoke(&chain, Address::ZERO, &two_call_batch()).await.unwrap_err();
        assert!(matches!(err, InfoError::Invoke(InvokeError::Unpack(_))));
    }
}
