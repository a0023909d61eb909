//! Server configuration read from the environment

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Number of accounts sampled per poll cycle (top-N by account id)
pub const MAX_ACCOUNTS: usize = 30;

/// Default delay between poll cycles
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

/// Default idle time before a keep-alive message is broadcast
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 10;

/// Default per-subscriber queue depth
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// Default listen address of the event server
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3102";

/// Default accounts file
pub const DEFAULT_ACCOUNTS_FILE: &str = "accounts.jsonl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings of the poll loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep between cycles
    pub poll_interval: Duration,
    /// Idle time after which `{}` is broadcast
    pub keep_alive_interval: Duration,
    /// Accounts requested from the source per cycle
    pub batch_size: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            keep_alive_interval: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            batch_size: MAX_ACCOUNTS,
        }
    }
}

/// Full server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub accounts_file: PathBuf,
    pub subscriber_capacity: usize,
    pub poll: PollConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            accounts_file: PathBuf::from(DEFAULT_ACCOUNTS_FILE),
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            poll: PollConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(|name| env::var(name).ok(), &current_dir)
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparsable numeric values fall back to their defaults with a warning.
    /// A zero poll interval or subscriber capacity is rejected.
    pub fn from_lookup<F>(lookup: F, current_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("EVENT_SERVER_ADDR").filter(|s| !s.trim().is_empty()) {
            config.listen_addr = addr.trim().to_string();
        }

        if let Some(path) = lookup("ACCOUNTS_FILE_PATH").filter(|s| !s.is_empty()) {
            let path = PathBuf::from(path);
            config.accounts_file = if path.is_absolute() {
                path
            } else {
                current_dir.join(path)
            };
        } else {
            config.accounts_file = current_dir.join(DEFAULT_ACCOUNTS_FILE);
        }

        let poll_ms = parse_or_default(
            "EVENT_SERVER_POLL",
            lookup("EVENT_SERVER_POLL"),
            DEFAULT_POLL_INTERVAL_MS,
        );
        if poll_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_SERVER_POLL",
                reason: "must be greater than zero".to_string(),
            });
        }
        config.poll.poll_interval = Duration::from_millis(poll_ms);

        let keep_alive = parse_or_default(
            "EVENT_SERVER_KEEPALIVE_SECS",
            lookup("EVENT_SERVER_KEEPALIVE_SECS"),
            DEFAULT_KEEP_ALIVE_SECS,
        );
        config.poll.keep_alive_interval = Duration::from_secs(keep_alive);

        let capacity = parse_or_default(
            "EVENT_SERVER_SUBSCRIBER_CAPACITY",
            lookup("EVENT_SERVER_SUBSCRIBER_CAPACITY"),
            DEFAULT_SUBSCRIBER_CAPACITY,
        );
        if capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_SERVER_SUBSCRIBER_CAPACITY",
                reason: "must be greater than zero".to_string(),
            });
        }
        config.subscriber_capacity = capacity;

        Ok(config)
    }
}

fn parse_or_default<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        Some(s) if !s.trim().is_empty() => match s.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(variable = name, value = %s, "ignoring unparsable value, using default");
                default
            }
        },
        _ => default,
    }
}
