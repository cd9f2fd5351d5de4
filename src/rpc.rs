//! RPC Client Selector
//!
//! Public RPC providers are individually unreliable. For every request the
//! chain's endpoints are shuffled and dialed one at a time until one
//! answers; earlier failures are logged and dropped, only the last is kept
//! for the error. Connections live for a single request.

use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::TransactionRequest;
use rand::seq::SliceRandom;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::chains::{ChainInfo, ChainRegistry};
use crate::error::{BoxError, InfoError};
use crate::multicall::ReadTransport;

/// Per-endpoint dial budget
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 10;

/// Opens a live connection to one endpoint of a chain.
pub trait Dialer {
    type Conn;

    fn dial(&self, chain: &ChainInfo, url: &str) -> impl Future<Output = Result<Self::Conn, BoxError>> + Send;
}

// ============================================
// HTTP (alloy) CONNECTION
// ============================================

pub struct Connection {
    provider: RootProvider,
    endpoint: String,
}

impl Connection {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReadTransport for Connection {
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, BoxError> {
        let tx = TransactionRequest::default().to(to).input(calldata.into());
        let result = self.provider.call(tx).await?;
        Ok(result)
    }
}

/// Dials over HTTP. Building an HTTP provider does no I/O, so the dial
/// probes `eth_chainId` and only counts the endpoint as live if it answers
/// with the chain's id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDialer;

impl Dialer for HttpDialer {
    type Conn = Connection;

    async fn dial(&self, chain: &ChainInfo, url: &str) -> Result<Connection, BoxError> {
        let parsed: Url = url.parse()?;
        let provider = RootProvider::new_http(parsed);

        let reported = provider.get_chain_id().await?;
        if reported != chain.id {
            return Err(format!("endpoint reports chain {}, expected {}", reported, chain.id).into());
        }

        Ok(Connection {
            provider,
            endpoint: url.to_string(),
        })
    }
}

// ============================================
// SELECTOR
// ============================================

/// Uniformly random permutation of the endpoint list
pub fn shuffled(endpoints: &[String]) -> Vec<String> {
    let mut order = endpoints.to_vec();
    order.shuffle(&mut rand::thread_rng());
    order
}

pub struct RpcSelector<D> {
    dialer: D,
    dial_timeout: Option<Duration>,
}

impl<D: Dialer> RpcSelector<D> {
    pub fn new(dialer: D) -> Self {
        Self {
            dialer,
            dial_timeout: Some(Duration::from_secs(DEFAULT_DIAL_TIMEOUT_SECS)),
        }
    }

    /// `None` waits on each endpoint for as long as it takes.
    pub fn with_dial_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    pub async fn connect(&self, registry: &ChainRegistry, chain_id: &str) -> Result<D::Conn, InfoError> {
        let chain = registry.lookup(chain_id)?;
        let endpoints = shuffled(&chain.rpc);
        let mut last_err: Option<BoxError> = None;

        for endpoint in &endpoints {
            let start = Instant::now();
            match self.dial_one(chain, endpoint).await {
                Ok(conn) => {
                    debug!("Connected to {} for chain {} in {:?}", endpoint, chain_id, start.elapsed());
                    return Ok(conn);
                }
                Err(e) => {
                    warn!("RPC {} failed: {}", endpoint, e);
                    last_err = Some(e);
                }
            }
        }

        Err(InfoError::Dial {
            chain_id: chain_id.to_string(),
            attempted: endpoints.len(),
            last: last_err.unwrap_or_else(|| "no endpoints configured".into()),
        })
    }

    async fn dial_one(&self, chain: &ChainInfo, endpoint: &str) -> Result<D::Conn, BoxError> {
        match self.dial_timeout {
            Some(limit) => tokio::time::timeout(limit, self.dialer.dial(chain, endpoint))
                .await
                .map_err(|_| BoxError::from(format!("dial timed out after {:?}", limit)))?,
            None => self.dialer.dial(chain, endpoint).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Endpoints in `live` connect, everything else is refused. A hanging
    /// endpoint never answers.
    #[derive(Default)]
    pub struct FakeDialer {
        pub live: HashSet<String>,
        pub hanging: HashSet<String>,
        pub attempts: Mutex<Vec<String>>,
    }

    impl FakeDialer {
        pub fn with_live(live: &[&str]) -> Self {
            Self {
                live: live.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl Dialer for FakeDialer {
        type Conn = String;

        async fn dial(&self, _chain: &ChainInfo, url: &str) -> Result<String, BoxError> {
            self.attempts.lock().unwrap().push(url.to_string());

            if self.hanging.contains(url) {
                std::future::pending::<()>().await;
            }
            if self.live.contains(url) {
                Ok(url.to_string())
            } else {
                Err(format!("connection refused: {url}").into())
            }
        }
    }
}
