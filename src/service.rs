//! Balance pipeline
//!
//! resolve chain -> build batch -> connect -> one multicall -> decode.
//! The batch is built before dialing so a malformed request never costs a
//! network round trip.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::chains::ChainRegistry;
use crate::error::Result;
use crate::multicall::{
    build_genesis_batch, build_pair_batch, decode_genesis_batch, decode_pair_batch, invoke,
    ReadTransport, SubcallFailurePolicy,
};
use crate::request::{GenesisRequest, PairRequest};
use crate::response::{GenesisResponse, PairResponse};
use crate::rpc::{Dialer, HttpDialer, RpcSelector};

pub type HttpInfoService = InfoService<HttpDialer>;

pub struct InfoService<D> {
    registry: Arc<ChainRegistry>,
    selector: RpcSelector<D>,
    policy: SubcallFailurePolicy,
}

impl<D> InfoService<D>
where
    D: Dialer + Sync,
    D::Conn: ReadTransport + Send + Sync,
{
    pub fn new(registry: Arc<ChainRegistry>, selector: RpcSelector<D>, policy: SubcallFailurePolicy) -> Self {
        Self {
            registry,
            selector,
            policy,
        }
    }

    pub async fn genesis_balances(&self, request: &GenesisRequest) -> Result<GenesisResponse> {
        let start = Instant::now();
        request.log_summary();

        let multicall = self.registry.multicall_address(&request.chain_id)?;
        let batch = build_genesis_batch(request)?;

        let conn = self.selector.connect(&self.registry, &request.chain_id).await?;
        let results = invoke(&conn, multicall, &batch).await?;
        let response = decode_genesis_batch(&batch, &results, request, self.policy)?;

        info!(
            "Genesis balances: chain {} | {} pools | user: {} | {:?}",
            request.chain_id,
            response.pools.len(),
            request.user_present(),
            start.elapsed()
        );
        Ok(response)
    }

    pub async fn pair_balance(&self, request: &PairRequest) -> Result<PairResponse> {
        let start = Instant::now();

        let multicall = self.registry.multicall_address(&request.chain_id)?;
        let batch = build_pair_batch(request)?;

        let conn = self.selector.connect(&self.registry, &request.chain_id).await?;
        let results = invoke(&conn, multicall, &batch).await?;
        let response = decode_pair_batch(&batch, &results, request, self.policy)?;

        info!(
            "Pair balance: chain {} | pair {} | user: {} | {:?}",
            request.chain_id,
            request.pair,
            request.user_present(),
            start.elapsed()
        );
        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::chains::ChainInfo;
    use crate::error::BoxError;
    use crate::multicall::testing::FakeChain;
    use alloy_primitives::{Address, Bytes};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Connection handed out by [`FakeChainDialer`]
    pub struct SharedChain(pub Arc<FakeChain>);

    impl ReadTransport for SharedChain {
        async fn call(&self, to: Address, calldata: Bytes) -> std::result::Result<Bytes, BoxError> {
            self.0.call(to, calldata).await
        }
    }

    /// Every dial succeeds and connects to the same in-memory chain.
    pub struct FakeChainDialer {
        pub chain: Arc<FakeChain>,
        pub dials: AtomicUsize,
    }

    impl FakeChainDialer {
        pub fn new(chain: FakeChain) -> Self {
            Self {
                chain: Arc::new(chain),
                dials: AtomicUsize::new(0),
            }
        }
    }

    impl Dialer for FakeChainDialer {
        type Conn = SharedChain;

        async fn dial(&self, _chain: &ChainInfo, _url: &str) -> std::result::Result<SharedChain, BoxError> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            Ok(SharedChain(self.chain.clone()))
        }
    }

    pub fn service(chain: FakeChain, policy: SubcallFailurePolicy) -> InfoService<FakeChainDialer> {
        InfoService::new(
            Arc::new(ChainRegistry::builtin()),
            RpcSelector::new(FakeChainDialer::new(chain)),
            policy,
        )
    }
}
