//! Validated run configuration.

use crate::client::coinmarketcap::{CoinMarketCapClientError, QuotesApi};
use crate::model::constants::{DEFAULT_CONCURRENCY, DEFAULT_POLKASCAN_URL};
use crate::model::{Network, NetworkError};
use crate::reconcile::{ReconcileConfig, TimeFilter};
use chrono::{DateTime, TimeDelta, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Account address is required")]
    Account,

    #[error("Invalid network")]
    Network(#[from] NetworkError),

    #[error("Invalid quotes API")]
    QuotesApi(#[from] CoinMarketCapClientError),

    #[error("Unable to parse `{0}` as an RFC 3339 date, e.g. `2020-01-01T00:00:00+00:00`")]
    Date(String, #[source] chrono::ParseError),

    #[error("`from` cannot be later than `to`: {from} > {to}")]
    DateOrder {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("Era must be a positive number of hours, got {0}")]
    Era(u64),

    #[error("Concurrency must be at least 1")]
    Concurrency,
}

/// Unvalidated settings, as given on the command line.
#[derive(Clone, Debug, Default)]
pub struct RawConfig {
    pub account: String,
    pub network: String,
    pub era_hours: Option<u64>,
    pub url: Option<String>,
    pub concurrency: Option<u64>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub csv: Option<PathBuf>,
    pub quotes_api: Option<String>,
    pub no_memo: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub reconcile: ReconcileConfig,

    /// Polkascan API base URL.
    pub url: String,

    /// Write the report as CSV to this path instead of a table on stdout.
    pub csv: Option<PathBuf>,

    pub quotes_api: QuotesApi,

    /// Load and save the block timestamp memo.
    pub memo: bool,
}

impl Config {
    /// Validate `raw`. A missing `to` date defaults to `now` when `from` is given.
    pub fn parse(raw: RawConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let account = raw.account.trim().to_string();
        if account.is_empty() {
            return Err(ConfigError::Account);
        }

        let network: Network = raw.network.parse()?;
        let era = match raw.era_hours {
            None => network.default_era(),
            Some(hours) => i64::try_from(hours)
                .ok()
                .filter(|hours| (1..=i64::from(i32::MAX)).contains(hours))
                .and_then(TimeDelta::try_hours)
                .ok_or(ConfigError::Era(hours))?,
        };

        let concurrency = match raw.concurrency {
            None => DEFAULT_CONCURRENCY,
            Some(0) => return Err(ConfigError::Concurrency),
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let start = raw.from.as_deref().map(parse_date).transpose()?;
        let end = match raw.to.as_deref().map(parse_date).transpose()? {
            Some(end) => Some(end),
            None => start.map(|_| now),
        };
        if let (Some(from), Some(to)) = (start, end) {
            if from > to {
                return Err(ConfigError::DateOrder { from, to });
            }
        }

        let quotes_api = match raw.quotes_api {
            Some(api) => api.parse()?,
            None => QuotesApi::default(),
        };

        Ok(Self {
            reconcile: ReconcileConfig {
                account,
                network,
                era,
                concurrency,
                filter: TimeFilter { start, end },
            },
            url: raw.url.unwrap_or_else(|| DEFAULT_POLKASCAN_URL.to_string()),
            csv: raw.csv,
            quotes_api,
            memo: !raw.no_memo,
        })
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        Self::parse(value, Utc::now())
    }
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, ConfigError> {
    DateTime::parse_from_rfc3339(s)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| ConfigError::Date(s.to_string(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawConfig {
        RawConfig {
            account: "13UVJyLnbVp9RBZYFwFGyDvVd1y27Tt8tkntv6Q7JVPhFsTB".to_string(),
            network: "polkadot".to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        "2022-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse(raw(), now()).unwrap();

        assert_eq!(config.reconcile.network, Network::Polkadot);
        assert_eq!(config.reconcile.era, TimeDelta::hours(24));
        assert_eq!(config.reconcile.concurrency, 100);
        assert_eq!(config.reconcile.filter, TimeFilter::default());
        assert_eq!(config.url, "https://explorer-32.polkascan.io");
        assert_eq!(config.quotes_api, QuotesApi::V3);
        assert!(config.csv.is_none());
        assert!(config.memo);
    }

    #[test]
    fn test_kusama_era() {
        let mut raw = raw();
        raw.network = "kusama".to_string();
        let config = Config::parse(raw.clone(), now()).unwrap();
        assert_eq!(config.reconcile.era, TimeDelta::hours(6));

        raw.era_hours = Some(12);
        let config = Config::parse(raw, now()).unwrap();
        assert_eq!(config.reconcile.era, TimeDelta::hours(12));
    }

    #[test]
    fn test_dates() {
        let mut raw = raw();
        raw.from = Some("2021-01-01T00:00:00+02:00".to_string());
        let config = Config::parse(raw.clone(), now()).unwrap();

        assert_eq!(
            config.reconcile.filter,
            TimeFilter {
                start: Some("2020-12-31T22:00:00Z".parse().unwrap()),
                end: Some(now()),
            }
        );

        raw.to = Some("2020-12-31T00:00:00Z".to_string());
        assert!(matches!(
            Config::parse(raw.clone(), now()),
            Err(ConfigError::DateOrder { .. })
        ));

        raw.to = Some("2021-02-30".to_string());
        assert!(matches!(
            Config::parse(raw, now()),
            Err(ConfigError::Date(date, _)) if date == "2021-02-30"
        ));
    }

    #[test]
    fn test_only_to_date() {
        let mut raw = raw();
        raw.to = Some("2021-06-01T00:00:00Z".to_string());
        let config = Config::parse(raw, now()).unwrap();

        assert_eq!(config.reconcile.filter.start, None);
        assert_eq!(
            config.reconcile.filter.end,
            Some("2021-06-01T00:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn test_invalid() {
        let mut bad = raw();
        bad.account = "  ".to_string();
        assert!(matches!(Config::parse(bad, now()), Err(ConfigError::Account)));

        let mut bad = raw();
        bad.network = "westend".to_string();
        assert!(matches!(Config::parse(bad, now()), Err(ConfigError::Network(_))));

        let mut bad = raw();
        bad.era_hours = Some(0);
        assert!(matches!(Config::parse(bad, now()), Err(ConfigError::Era(0))));

        let mut bad = raw();
        bad.concurrency = Some(0);
        assert!(matches!(Config::parse(bad, now()), Err(ConfigError::Concurrency)));

        let mut bad = raw();
        bad.quotes_api = Some("v2".to_string());
        assert!(matches!(Config::parse(bad, now()), Err(ConfigError::QuotesApi(_))));
    }
}
