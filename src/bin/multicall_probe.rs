//! Multicall Probe
//!
//! Run with: cargo run --bin multicall-probe -- \
//!     --genesis 0x... --pool 0x...:0 --pool 0x...:1 [--user 0x...]
//!
//! Runs one genesis-balances query against a live chain, then re-reads
//! every batched call with its own eth_call and checks both agree.

use clap::Parser;
use eyre::{eyre, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use genesis_info::chains::ChainRegistry;
use genesis_info::multicall::{build_genesis_batch, decode_genesis_batch, invoke, ReadTransport};
use genesis_info::request::{GenesisRequest, QueryPairs};
use genesis_info::rpc::{HttpDialer, RpcSelector};
use genesis_info::SubcallFailurePolicy;

#[derive(Parser, Debug)]
#[command(name = "multicall-probe")]
#[command(about = "Compare one batched multicallView read with individual eth_calls")]
struct Args {
    #[arg(long, default_value = "146")]
    chain_id: String,

    /// Genesis contract
    #[arg(long)]
    genesis: String,

    /// Pool token and pool id as ADDRESS:PID, repeatable
    #[arg(long = "pool", required = true)]
    pools: Vec<String>,

    #[arg(long)]
    user: Option<String>,

    /// TOML chain table instead of the built-in one
    #[arg(long)]
    chains_file: Option<PathBuf>,
}

impl Args {
    /// Reuse the HTTP query parser so the probe validates input the same way.
    fn to_query(&self) -> Result<QueryPairs> {
        let mut pairs = vec![
            ("chain-id".to_string(), self.chain_id.clone()),
            ("genesis".to_string(), self.genesis.clone()),
        ];
        if let Some(user) = &self.user {
            pairs.push(("user".to_string(), user.clone()));
        }
        for pool in &self.pools {
            let (address, pid) = pool
                .split_once(':')
                .ok_or_else(|| eyre!("--pool expects ADDRESS:PID, got {pool}"))?;
            pairs.push(("pools.address".to_string(), address.to_string()));
            pairs.push(("pools.pid".to_string(), pid.to_string()));
        }
        Ok(QueryPairs::from(pairs))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genesis_info=info")),
        )
        .init();

    let args = Args::parse();

    println!("🧪 Multicall Probe");
    println!("==================\n");

    let registry = match &args.chains_file {
        Some(path) => ChainRegistry::from_file(path)?,
        None => ChainRegistry::builtin(),
    };
    registry.validate()?;

    let request = GenesisRequest::from_query(&args.to_query()?)?;
    let chain = registry.lookup(&request.chain_id)?;
    let multicall = registry.multicall_address(&request.chain_id)?;
    println!("📡 Chain: {} ({}) | multicall {}\n", chain.name, chain.id, multicall);

    let batch = build_genesis_batch(&request)?;
    let conn = RpcSelector::new(HttpDialer).connect(&registry, &request.chain_id).await?;
    println!("   Connected via {}\n", conn.endpoint());

    // ============================================
    // BATCHED: one multicallView
    // ============================================
    println!("📊 Batched read");
    println!("---------------");

    let start = Instant::now();
    let results = invoke(&conn, multicall, &batch).await?;
    let batched_time = start.elapsed();
    println!("   {} calls in {:?} (1 RPC call)", batch.len(), batched_time);

    let response = decode_genesis_batch(&batch, &results, &request, SubcallFailurePolicy::Null)?;
    println!("{}\n", serde_json::to_string_pretty(&response)?);

    // ============================================
    // INDIVIDUAL: one eth_call per CallSpec
    // ============================================
    println!("📊 Individual reads");
    println!("-------------------");

    let start = Instant::now();
    let mut mismatches = 0usize;

    for (index, (call, batched)) in batch.calls().iter().zip(results.iter()).enumerate() {
        let encoded = call.encode()?;
        let single = conn.call(call.target, encoded.callData).await;

        let verdict = match (&single, batched.success) {
            (Ok(data), true) if *data == batched.return_data => "✓ match",
            (Err(_), false) => "✓ both reverted",
            _ => {
                mismatches += 1;
                "✗ MISMATCH"
            }
        };
        println!("   [{:>2}] {:<24} {:<12} {}", index, call.tag.to_string(), call.method, verdict);
    }

    println!(
        "   {} calls in {:?} ({} RPC calls)\n",
        batch.len(),
        start.elapsed(),
        batch.len()
    );

    if mismatches > 0 {
        return Err(eyre!("{mismatches} of {} batched results disagree with individual reads", batch.len()));
    }

    println!("✅ Batched and individual reads agree");
    Ok(())
}
