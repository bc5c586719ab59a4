use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Unknown network `{0}`. Try one of: `polkadot`, `kusama`")]
    Parse(String),
}

/// Relay chains with staking rewards.
#[derive(Copy, Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Polkadot,
    Kusama,
}

impl Network {
    /// Name used in explorer API paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polkadot => "polkadot",
            Self::Kusama => "kusama",
        }
    }

    /// Native token ticker.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Polkadot => "DOT",
            Self::Kusama => "KSM",
        }
    }

    /// Planck per whole token.
    pub fn planck_divider(self) -> Decimal {
        match self {
            Self::Polkadot => Decimal::from(10_000_000_000_u64),
            Self::Kusama => Decimal::from(1_000_000_000_000_u64),
        }
    }

    /// CoinMarketCap asset ID of the native token.
    pub fn coinmarketcap_id(self) -> u32 {
        match self {
            Self::Polkadot => 6636,
            Self::Kusama => 5034,
        }
    }

    /// Typical interval between staking payouts.
    pub fn default_era(self) -> TimeDelta {
        match self {
            Self::Polkadot => TimeDelta::hours(24),
            Self::Kusama => TimeDelta::hours(6),
        }
    }
}

impl FromStr for Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polkadot" | "dot" => Ok(Self::Polkadot),
            "kusama" | "ksm" => Ok(Self::Kusama),
            _ => Err(NetworkError::Parse(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
