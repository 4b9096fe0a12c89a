//! Centralized configuration (environment variables + defaults).
//!
//! Everything is read once into [`AppConfig`] at process start and handed to the
//! components that need it; nothing below keeps process-wide client state.

use anyhow::{anyhow, Context};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SUI_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
pub const DEFAULT_PACKAGE_ID: &str =
    "0x6bf6f69adf6e5cf1d69ffc43e346de907aecdad4ef211632cd0d5d60eb5c5cf2";

/// Public testnet publishers, most reliable first.
pub const DEFAULT_PUBLISHERS: &[&str] = &[
    "https://walrus-testnet-publisher.stakecraft.com",
    "https://walrus-testnet-publisher.nodeinfra.com",
    "https://publisher.walrus-testnet.walrus.space",
    "https://walrus-testnet-publisher.everstake.one",
    "https://sm1-walrus-testnet-publisher.stakesquid.com",
    "https://walrus-testnet-publisher.nodes.guru",
    "https://walrus-publisher-testnet.staketab.org",
    "https://walrus-testnet-publisher.stakely.io",
];

pub const DEFAULT_AGGREGATORS: &[&str] = &["https://aggregator.walrus-testnet.walrus.space"];

/// Where the claim contract lives and what it is called.
#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub package_id: String,
    pub module: String,
    pub mint_function: String,
    pub claim_struct: String,
    pub event_struct: String,
}

impl ContractConfig {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            module: "faceguard".to_string(),
            mint_function: "mint_ownership".to_string(),
            claim_struct: "FaceOwnershipNFT".to_string(),
            event_struct: "FaceRegistered".to_string(),
        }
    }

    /// Fully qualified type of the claim object.
    pub fn claim_type(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.claim_struct)
    }

    /// Fully qualified type of the registration event.
    pub fn event_type(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.event_struct)
    }
}

/// Blob store settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Publisher base URLs in preference order.
    pub publishers: Vec<String>,
    /// Aggregator base URLs for reads, in preference order.
    pub aggregators: Vec<String>,
    pub epochs: u32,
    pub attempt_timeout: Duration,
    pub store_path: String,
    pub read_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            publishers: DEFAULT_PUBLISHERS.iter().map(|s| s.to_string()).collect(),
            aggregators: DEFAULT_AGGREGATORS.iter().map(|s| s.to_string()).collect(),
            epochs: 100,
            attempt_timeout: Duration::from_millis(5_000),
            store_path: "/v1/store".to_string(),
            read_path: "/v1/blobs".to_string(),
        }
    }
}

/// Timing and sizing for claim submission and lookup.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub request_timeout: Duration,
    pub settlement_delay: Duration,
    pub settlement_poll: Duration,
    pub submit_deadline: Duration,
    pub event_scan_limit: usize,
    pub owned_scan_limit: usize,
    pub gas_budget: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_SUI_RPC_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            settlement_delay: Duration::from_millis(1_000),
            settlement_poll: Duration::from_millis(500),
            submit_deadline: Duration::from_millis(30_000),
            event_scan_limit: 50,
            owned_scan_limit: 50,
            gas_budget: 10_000_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub contract: ContractConfig,
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    /// Register with a provisional blob id when every publisher fails.
    pub allow_provisional_blob: bool,
    /// Server-side signing key (keystore base64 or hex seed).
    pub private_key: Option<String>,
    /// Fallback keystore file when no key is given directly.
    pub keystore_path: Option<String>,
    pub api_bind_addr: String,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let storage_defaults = StorageConfig::default();
        let ledger_defaults = LedgerConfig::default();

        let mut contract = ContractConfig::new(env_or("FACEGUARD_PACKAGE_ID", DEFAULT_PACKAGE_ID));
        if let Some(module) = env_opt("FACEGUARD_MODULE") {
            contract.module = module;
        }

        let publishers = match env_opt("WALRUS_PUBLISHERS") {
            Some(v) => parse_url_list("WALRUS_PUBLISHERS", &v)?,
            None => storage_defaults.publishers.clone(),
        };
        let aggregators = match env_opt("WALRUS_AGGREGATORS") {
            Some(v) => parse_url_list("WALRUS_AGGREGATORS", &v)?,
            None => storage_defaults.aggregators.clone(),
        };

        let storage = StorageConfig {
            publishers,
            aggregators,
            epochs: env_parse("WALRUS_EPOCHS", storage_defaults.epochs)?,
            attempt_timeout: env_millis("UPLOAD_ATTEMPT_TIMEOUT_MS", storage_defaults.attempt_timeout)?,
            ..storage_defaults
        };

        let ledger = LedgerConfig {
            rpc_url: env_or("SUI_RPC_URL", DEFAULT_SUI_RPC_URL),
            settlement_delay: env_millis("SETTLEMENT_DELAY_MS", ledger_defaults.settlement_delay)?,
            settlement_poll: env_millis("SETTLEMENT_POLL_MS", ledger_defaults.settlement_poll)?,
            submit_deadline: env_millis("SUBMIT_DEADLINE_MS", ledger_defaults.submit_deadline)?,
            event_scan_limit: env_parse("EVENT_SCAN_LIMIT", ledger_defaults.event_scan_limit)?.max(1),
            gas_budget: env_parse("GAS_BUDGET", ledger_defaults.gas_budget)?,
            ..ledger_defaults
        };

        Ok(Self {
            contract,
            storage,
            ledger,
            allow_provisional_blob: env_parse("ALLOW_PROVISIONAL_BLOB", true)?,
            private_key: env_opt("SUI_PRIVATE_KEY"),
            keystore_path: env_opt("SUI_KEYSTORE"),
            api_bind_addr: env_or("API_BIND_ADDR", "0.0.0.0:3000"),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(v) => v
            .parse::<T>()
            .map_err(|e| anyhow!("{} must be a valid value ({}): {}", key, v, e)),
        None => Ok(default),
    }
}

fn env_millis(key: &str, default: Duration) -> anyhow::Result<Duration> {
    let ms = env_parse(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

/// Comma separated list of base URLs. Trailing slashes are dropped.
pub fn parse_url_list(key: &str, raw: &str) -> anyhow::Result<Vec<String>> {
    let urls: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if urls.is_empty() {
        return Err(anyhow!("{} must list at least one URL", key));
    }
    for url in &urls {
        reqwest::Url::parse(url).with_context(|| format!("{} contains an invalid URL: {}", key, url))?;
    }
    Ok(urls)
}
