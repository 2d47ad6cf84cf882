// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for token records, keys and audit logs | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `MIN_CREATION_LAMPORTS` | Wallet balance required to create a token | `10000000` |
//! | `FUNDING_LAMPORTS` | Faucet grant requested for a new mint authority | `1000000000` |
//! | `RECONCILE_INTERVAL_SECS` | Seconds between balance reconcile cycles | `30` |
//! | `HISTORY_LIMIT` | Signatures fetched per history request | `10` |
//! | `WALLET_ADDRESS` | Wallet to connect at startup | unset |
//! | `SIM_WALLET_LAMPORTS` | Lamports granted to `WALLET_ADDRESS` on the simulated ledger | `2000000000` |

use std::time::Duration;

use crate::amount::DEFAULT_DECIMALS;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// `json` for machine-readable logs, anything else for human-readable.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const MIN_CREATION_LAMPORTS_ENV: &str = "MIN_CREATION_LAMPORTS";
pub const FUNDING_LAMPORTS_ENV: &str = "FUNDING_LAMPORTS";
pub const RECONCILE_INTERVAL_ENV: &str = "RECONCILE_INTERVAL_SECS";
pub const HISTORY_LIMIT_ENV: &str = "HISTORY_LIMIT";

/// Wallet connected at startup, if set.
pub const WALLET_ADDRESS_ENV: &str = "WALLET_ADDRESS";

/// Lamports the simulated ledger credits to `WALLET_ADDRESS` at startup.
pub const SIM_WALLET_LAMPORTS_ENV: &str = "SIM_WALLET_LAMPORTS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// 0.01 native coin.
pub const DEFAULT_MIN_CREATION_LAMPORTS: u64 = 10_000_000;

/// 1 native coin.
pub const DEFAULT_FUNDING_LAMPORTS: u64 = 1_000_000_000;

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_SIM_WALLET_LAMPORTS: u64 = 2_000_000_000;

/// Tunables of the token lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Native balance the wallet needs before a token can be created.
    pub min_creation_lamports: u64,
    /// Faucet grant requested for every new or regenerated mint authority.
    pub funding_lamports: u64,
    pub default_decimals: u8,
    pub reconcile_interval: Duration,
    pub history_limit: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            min_creation_lamports: DEFAULT_MIN_CREATION_LAMPORTS,
            funding_lamports: DEFAULT_FUNDING_LAMPORTS,
            default_decimals: DEFAULT_DECIMALS,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ManagerConfig {
    /// Load overrides from the environment; unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_creation_lamports: env_parse(MIN_CREATION_LAMPORTS_ENV)
                .unwrap_or(defaults.min_creation_lamports),
            funding_lamports: env_parse(FUNDING_LAMPORTS_ENV).unwrap_or(defaults.funding_lamports),
            default_decimals: defaults.default_decimals,
            reconcile_interval: env_parse(RECONCILE_INTERVAL_ENV)
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconcile_interval),
            history_limit: env_parse(HISTORY_LIMIT_ENV)
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.history_limit),
        }
    }
}

/// Parse an environment variable, warning when it is set but malformed.
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring malformed environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ManagerConfig::default();
        assert_eq!(config.min_creation_lamports, 10_000_000);
        assert_eq!(config.funding_lamports, 1_000_000_000);
        assert_eq!(config.default_decimals, 9);
        assert_eq!(config.reconcile_interval, Duration::from_secs(30));
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn env_parse_reads_and_rejects() {
        std::env::set_var("RTM_TEST_PARSE_OK", " 42 ");
        std::env::set_var("RTM_TEST_PARSE_BAD", "forty-two");

        assert_eq!(env_parse::<u64>("RTM_TEST_PARSE_OK"), Some(42));
        assert_eq!(env_parse::<u64>("RTM_TEST_PARSE_BAD"), None);
        assert_eq!(env_parse::<u64>("RTM_TEST_PARSE_UNSET"), None);
    }
}
