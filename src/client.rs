use crate::model::{ConvertAmountError, Network, PricePoint, RewardRecord};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

pub mod coinmarketcap;
pub mod polkascan;

/// Lists the staking rewards paid to an account.
///
/// Exists as a trait so that unit tests can mock the explorer responses.
pub trait RewardSource {
    /// Every reward ever paid to `account`, without timestamps.
    fn list_rewards(&self, account: &str, network: Network)
        -> Result<Vec<RewardRecord>, ClientError>;
}

/// Resolves block numbers to the time the block was produced.
///
/// Implementations are called concurrently from the timestamp resolution pool.
pub trait BlockResolver {
    fn block_timestamp(&self, network: Network, block_id: u64)
        -> Result<DateTime<Utc>, ClientError>;
}

/// Historical USD quotes for a network's native token.
pub trait PriceProvider {
    /// Price points between `start` and `end`, in no particular order.
    ///
    /// Providers may truncate long ranges, returning only the most recent points. An empty `Vec`
    /// means there is no data for the range.
    fn historical_prices(
        &self,
        network: Network,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ClientError>;
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed")]
    Http(#[from] ureq::Error),

    #[error("Unable to build request")]
    Uri(#[from] explorda::Error),

    #[error("No rewards found for `{0}`")]
    NoRewards(String),

    #[error("Block {0} not found")]
    NoBlock(u64),

    #[error("Unexpected type for `{field}`: found {found}")]
    UnexpectedType {
        field: &'static str,
        found: &'static str,
    },

    #[error("Invalid amount")]
    Amount(#[from] ConvertAmountError),

    #[error("API error: {0}")]
    Api(String),
}

/// Create an HTTP agent for `max_connections` concurrent requests to one host.
///
/// With `status_as_error` unset, 4xx and 5xx responses are returned as successful responses so
/// the caller can decode the API's own error body.
pub(crate) fn new_agent(
    max_connections: usize,
    timeout: Duration,
    status_as_error: bool,
) -> Agent {
    Agent::from(
        Agent::config_builder()
            .max_idle_connections_per_host(max_connections)
            .timeout_global(Some(timeout))
            .http_status_as_error(status_as_error)
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build(),
    )
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_client_error_is_send_sync() {
        assert_send_sync::<ClientError>();
    }

    #[test]
    fn test_json_type_name() {
        let value: serde_json::Value = serde_json::from_str(r#"["1", 2, null]"#).unwrap();

        assert_eq!(json_type_name(&value), "array");
        assert_eq!(json_type_name(&value[0]), "string");
        assert_eq!(json_type_name(&value[1]), "number");
        assert_eq!(json_type_name(&value[2]), "null");
    }
}
