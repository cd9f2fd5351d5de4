//! Genesis Info - on-chain balance API
//!
//! Run with: cargo run -- --server local

use clap::Parser;
use color_eyre::eyre::Result;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use genesis_info::api;
use genesis_info::config::{Config, ServerMode};
use genesis_info::rpc::{HttpDialer, RpcSelector};
use genesis_info::service::HttpInfoService;

#[derive(Parser, Debug)]
#[command(name = "genesis-info")]
#[command(about = "Genesis pool and pair balances over one multicall", version)]
struct Args {
    /// Selects the env file: .env.local or .env
    #[arg(long, value_enum, default_value_t = ServerMode::Production)]
    server: ServerMode,

    /// Listen address (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// TOML chain table (overrides CHAINS_FILE)
    #[arg(long)]
    chains_file: Option<PathBuf>,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" GENESIS INFO - Balance API").cyan().bold()
    );
    println!(
        "{}",
        style("    One multicall per request | Randomized RPC failover").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let env_file = args.server.load_env_file();

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(path) = args.chains_file {
        config.chains_file = Some(path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_directive())),
        )
        .init();

    print_banner();

    match env_file {
        Some(path) => info!("Mode {} | env loaded from {}", args.server, path.display()),
        None => info!("Mode {} | no {} found, using process environment", args.server, args.server.env_file()),
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your {} file", args.server.env_file());
        return Err(e);
    }

    let registry = config.chain_registry()?;
    config.print_summary(&registry);
    println!();

    let selector = RpcSelector::new(HttpDialer).with_dial_timeout(config.dial_timeout());
    let service = Arc::new(HttpInfoService::new(
        Arc::new(registry),
        selector,
        config.subcall_failure_policy,
    ));

    let app = api::router(service);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    info!("Server ready at http://{}", config.bind_addr);
    info!("  GET /api/info?query={{version,get-genesis-balances,get-pair-balance}}");
    info!("  GET /health");

    axum::serve(listener, app).await?;

    Ok(())
}
