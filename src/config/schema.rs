//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::Chain;

/// Root configuration for the BioCoin API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Deployment environment; controls error detail in responses.
    pub environment: Environment,

    /// Per-chain RPC and contract settings.
    pub chains: ChainsConfig,

    /// Known callers and their wallets.
    pub auth: AuthConfig,

    /// Data providers paid for data access.
    pub catalog: CatalogConfig,

    /// Transaction record persistence.
    pub ledger: LedgerConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Whether internal error messages may be echoed to clients.
    pub fn exposes_errors(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// How an adapter settles payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Validate and fabricate a transaction id; nothing is broadcast.
    #[default]
    Simulated,
    /// Sign and broadcast a real transaction.
    OnChain,
}

/// Settings for a single chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Register an adapter for this chain at startup.
    pub enabled: bool,

    /// JSON-RPC endpoint URL. Empty means the chain's public test endpoint.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Token contract address (BSC) or program id (Solana).
    pub contract_id: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// EVM chain ID (97 for BSC testnet). Ignored for Solana.
    pub chain_id: u64,

    pub settlement: Settlement,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// How long to wait for an on-chain payment receipt.
    pub confirmation_timeout_secs: u64,

    /// Environment variable holding the demo payer key, read once at startup.
    pub signer_key_env: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            contract_id: String::new(),
            rpc_timeout_secs: 10,
            chain_id: 97,
            settlement: Settlement::Simulated,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 100,
            confirmation_timeout_secs: 60,
            signer_key_env: "DEMO_PRIVATE_KEY".to_string(),
        }
    }
}

impl ChainConfig {
    /// The RPC URL to connect to, falling back to the chain's public endpoint.
    pub fn effective_rpc_url(&self, chain: Chain) -> String {
        if self.rpc_url.trim().is_empty() {
            chain.default_rpc_url().to_string()
        } else {
            self.rpc_url.clone()
        }
    }
}

/// Per-chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ChainsConfig {
    pub solana: ChainConfig,
    pub bsc: ChainConfig,
}

impl ChainsConfig {
    pub fn get(&self, chain: Chain) -> &ChainConfig {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Bsc => &self.bsc,
        }
    }

    pub fn get_mut(&mut self, chain: Chain) -> &mut ChainConfig {
        match chain {
            Chain::Solana => &mut self.solana,
            Chain::Bsc => &mut self.bsc,
        }
    }
}

/// Wallet addresses, one optional entry per chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletMap {
    pub solana: Option<String>,
    pub bsc: Option<String>,
}

impl WalletMap {
    pub fn get(&self, chain: Chain) -> Option<&str> {
        let address = match chain {
            Chain::Solana => &self.solana,
            Chain::Bsc => &self.bsc,
        };
        address.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// Iterate over the chains that have an address.
    pub fn iter(&self) -> impl Iterator<Item = (Chain, &str)> + '_ {
        Chain::ALL
            .into_iter()
            .filter_map(move |chain| self.get(chain).map(|address| (chain, address)))
    }
}

/// A caller allowed to use the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Stable user identifier.
    pub id: String,

    /// Bearer token presented in the Authorization header.
    pub api_key: String,

    /// The caller's registered wallets.
    #[serde(default)]
    pub wallets: WalletMap,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub users: Vec<UserConfig>,
}

/// A party selling access to data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub id: String,

    #[serde(default)]
    pub wallets: WalletMap,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        // Demo provider; wallets must be configured before payments succeed.
        Self {
            id: "provider123".to_string(),
            wallets: WalletMap::default(),
        }
    }
}

/// A dataset sold by a specific provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    pub data_id: String,
    pub provider: ProviderConfig,
}

/// Data catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Provider for any dataset without its own entry.
    pub default_provider: ProviderConfig,

    pub datasets: Vec<DatasetConfig>,
}

/// Transaction ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON file loaded at startup and written at shutdown.
    pub persistence_path: Option<String>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Allow any origin (the SPA is served from a different host).
    pub permissive_cors: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            permissive_cors: true,
        }
    }
}
