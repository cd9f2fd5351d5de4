//! Server Configuration
//!
//! Settings come from the process environment, optionally seeded from an
//! env file chosen by the server mode. The chain table is loaded once here
//! and handed to the service as an immutable value.

use clap::ValueEnum;
use eyre::{Result, WrapErr};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::chains::ChainRegistry;
use crate::multicall::SubcallFailurePolicy;
use crate::rpc::DEFAULT_DIAL_TIMEOUT_SECS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

// ============================================
// SERVER MODE
// ============================================

/// Which env file seeds the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ServerMode {
    /// `.env.local`
    Local,
    /// `.env`
    #[default]
    Production,
}

impl ServerMode {
    pub fn env_file(&self) -> &'static str {
        match self {
            ServerMode::Local => ".env.local",
            ServerMode::Production => ".env",
        }
    }

    /// Load the mode's env file. Variables already set in the process win;
    /// a missing file is not an error.
    pub fn load_env_file(&self) -> Option<PathBuf> {
        match dotenvy::from_filename(self.env_file()) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("No env file loaded from {}: {}", self.env_file(), e);
                None
            }
        }
    }
}

impl std::fmt::Display for ServerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerMode::Local => write!(f, "LOCAL"),
            ServerMode::Production => write!(f, "PRODUCTION"),
        }
    }
}

// ============================================
// CONFIG
// ============================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    /// Raises the default log level to debug
    pub debug_mode: bool,
    pub subcall_failure_policy: SubcallFailurePolicy,
    /// TOML chain table replacing the built-in one
    pub chains_file: Option<PathBuf>,
    /// Per-endpoint dial budget; 0 disables the timeout
    pub dial_timeout_secs: u64,
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let subcall_failure_policy = match lookup("SUBCALL_FAILURE_POLICY") {
            Some(value) => value
                .parse()
                .map_err(|e: String| eyre::eyre!(e))
                .wrap_err("invalid SUBCALL_FAILURE_POLICY")?,
            None => SubcallFailurePolicy::default(),
        };

        let dial_timeout_secs = match lookup("DIAL_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .wrap_err_with(|| format!("invalid DIAL_TIMEOUT_SECS: {value}"))?,
            None => DEFAULT_DIAL_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            debug_mode: lookup("DEBUG_MODE_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            subcall_failure_policy,
            chains_file: lookup("CHAINS_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            dial_timeout_secs,
        })
    }

    pub fn dial_timeout(&self) -> Option<Duration> {
        (self.dial_timeout_secs > 0).then(|| Duration::from_secs(self.dial_timeout_secs))
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> &'static str {
        if self.debug_mode {
            "genesis_info=debug"
        } else {
            "genesis_info=info"
        }
    }

    /// The built-in chain table, or the one in `chains_file`, validated.
    pub fn chain_registry(&self) -> Result<ChainRegistry> {
        let registry = match &self.chains_file {
            Some(path) => load_chain_file(path)?,
            None => ChainRegistry::builtin(),
        };

        if registry.is_empty() {
            return Err(eyre::eyre!("chain table is empty"));
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<SocketAddr>()
            .wrap_err_with(|| format!("BIND_ADDR {} is not a socket address", self.bind_addr))?;

        if let Some(path) = &self.chains_file {
            if !path.exists() {
                return Err(eyre::eyre!("CHAINS_FILE {} does not exist", path.display()));
            }
        }
        Ok(())
    }

    pub fn print_summary(&self, registry: &ChainRegistry) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              GENESIS INFO - CONFIGURATION                  ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Bind Address:      {:^40} ║", self.bind_addr);
        println!("║ Debug Mode:        {:^40} ║",
            if self.debug_mode { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("║ Sub-call Failures: {:^40} ║", self.subcall_failure_policy);
        println!("║ Dial Timeout:      {:^40} ║",
            match self.dial_timeout() {
                Some(t) => format!("{}s", t.as_secs()),
                None => "none".to_string(),
            }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CHAINS                                                     ║");
        println!("║ • Source:          {:^40} ║",
            match &self.chains_file {
                Some(path) => path.display().to_string(),
                None => "built-in".to_string(),
            }
        );
        println!("║ • Keys:            {:^40} ║", registry.keys().join(", "));
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn load_chain_file(path: &Path) -> Result<ChainRegistry> {
    ChainRegistry::from_file(path).wrap_err_with(|| format!("loading chain table {}", path.display()))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            debug_mode: false,
            subcall_failure_policy: SubcallFailurePolicy::default(),
            chains_file: None,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
        }
    }
}
