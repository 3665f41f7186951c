use std::{env, time::Duration};

use chrono::Duration as ChronoDuration;
use log::*;
use lp_common::Secret;
use rand::{distributions::Alphanumeric, Rng};

const DEFAULT_LOYALTY_HOST: &str = "127.0.0.1";
const DEFAULT_LOYALTY_PORT: u16 = 8080;
const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_POLL_BATCH_SIZE: i64 = 10;
const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the external accrual service.
    pub accrual_url: String,
    pub auth: AuthConfig,
    pub reconciliation: ReconciliationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LOYALTY_HOST.to_string(),
            port: DEFAULT_LOYALTY_PORT,
            database_url: String::default(),
            accrual_url: String::default(),
            auth: AuthConfig::default(),
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LOYALTY_HOST").ok().unwrap_or_else(|| DEFAULT_LOYALTY_HOST.into());
        let port = env::var("LOYALTY_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for LOYALTY_PORT. {e} Using the default, \
                         {DEFAULT_LOYALTY_PORT}, instead."
                    );
                    DEFAULT_LOYALTY_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_LOYALTY_PORT);
        let database_url = env::var("LOYALTY_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ LOYALTY_DATABASE_URL is not set. Please set it to the URL for the loyalty database.");
            String::default()
        });
        let accrual_url = env::var("LOYALTY_ACCRUAL_URL").ok().unwrap_or_else(|| {
            error!("🪛️ LOYALTY_ACCRUAL_URL is not set. Orders will not be reconciled until it is.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let reconciliation = ReconciliationConfig::from_env_or_default();
        Self { host, port, database_url, accrual_url, auth, reconciliation }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The key used to sign and verify bearer tokens.
    pub secret: Secret<String>,
    pub token_expiry: ChronoDuration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { secret: Secret::new(random_secret()), token_expiry: ChronoDuration::hours(DEFAULT_TOKEN_EXPIRY_HOURS) }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("LOYALTY_JWT_SECRET").map(Secret::new).ok().unwrap_or_else(|| {
            warn!(
                "🪛️ LOYALTY_JWT_SECRET is not set. A random signing key will be used; tokens will not survive a \
                 server restart."
            );
            Secret::new(random_secret())
        });
        let token_expiry = env::var("LOYALTY_TOKEN_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(ChronoDuration::hours)
            .unwrap_or_else(|| ChronoDuration::hours(DEFAULT_TOKEN_EXPIRY_HOURS));
        Self { secret, token_expiry }
    }
}

fn random_secret() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}

/// Knobs for the reconciliation pipeline. The defaults match the reference behaviour (200 ms poll, batches of 10)
/// but none of them are contractual.
#[derive(Clone, Copy, Debug)]
pub struct ReconciliationConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS), batch_size: DEFAULT_POLL_BATCH_SIZE }
    }
}

impl ReconciliationConfig {
    pub fn from_env_or_default() -> Self {
        let poll_interval = env::var("LOYALTY_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        let batch_size = env::var("LOYALTY_POLL_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_POLL_BATCH_SIZE);
        Self { poll_interval, batch_size }
    }
}
