//! The configuration record consumed (not owned) by the kernel: database
//! pool tuning and web-fetch tuning, loaded from `MCP_`-prefixed
//! environment variables via `figment`, with CLI overrides via `clap`.

use figment::Figment;
use figment::providers::Env;
use serde::Deserialize;

fn default_log_level() -> String {
    "info".to_string()
}
fn default_db_pool_size() -> u32 {
    10
}
fn default_db_pool_min_idle() -> u32 {
    2
}
fn default_db_connection_timeout_ms() -> u64 {
    30_000
}
fn default_db_idle_timeout_ms() -> u64 {
    600_000
}
fn default_db_max_lifetime_ms() -> u64 {
    1_800_000
}
fn default_db_leak_detection_ms() -> u64 {
    60_000
}
fn default_web_connection_timeout_ms() -> u64 {
    10_000
}
fn default_web_read_timeout_ms() -> u64 {
    10_000
}
fn default_web_max_page_size_bytes() -> u64 {
    10_000_000
}
fn default_web_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

/// Recognised configuration options (spec §6). Anything not recognised is
/// ignored rather than rejected — the config layer is additive ambient
/// infrastructure, not a strict wire contract.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_db_pool_size")]
    pub db_pool_size: u32,
    #[serde(default = "default_db_pool_min_idle")]
    pub db_pool_min_idle: u32,
    #[serde(default = "default_db_connection_timeout_ms")]
    pub db_connection_timeout_ms: u64,
    #[serde(default = "default_db_idle_timeout_ms")]
    pub db_idle_timeout_ms: u64,
    #[serde(default = "default_db_max_lifetime_ms")]
    pub db_max_lifetime_ms: u64,
    #[serde(default = "default_db_leak_detection_ms")]
    pub db_leak_detection_ms: u64,
    #[serde(default = "default_web_connection_timeout_ms")]
    pub web_connection_timeout_ms: u64,
    #[serde(default = "default_web_read_timeout_ms")]
    pub web_read_timeout_ms: u64,
    #[serde(default = "default_web_max_page_size_bytes")]
    pub web_max_page_size_bytes: u64,
    #[serde(default = "default_web_user_agent")]
    pub web_user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            db_pool_size: default_db_pool_size(),
            db_pool_min_idle: default_db_pool_min_idle(),
            db_connection_timeout_ms: default_db_connection_timeout_ms(),
            db_idle_timeout_ms: default_db_idle_timeout_ms(),
            db_max_lifetime_ms: default_db_max_lifetime_ms(),
            db_leak_detection_ms: default_db_leak_detection_ms(),
            web_connection_timeout_ms: default_web_connection_timeout_ms(),
            web_read_timeout_ms: default_web_read_timeout_ms(),
            web_max_page_size_bytes: default_web_max_page_size_bytes(),
            web_user_agent: default_web_user_agent(),
        }
    }
}

impl Config {
    /// Load from `MCP_*` environment variables, falling back to defaults
    /// for anything unset.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(Config::default()))
            .merge(Env::prefixed("MCP_"))
            .extract()
    }
}
