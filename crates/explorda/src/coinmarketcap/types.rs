//! CoinMarketCap JSON response bodies.

use super::START_AFTER_END;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error code in a [`Status`]. The v1 API uses numbers, the v3 API uses numeric strings.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

/// Response status, common to all API versions.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub error_code: Option<ErrorCode>,

    #[serde(default)]
    pub error_message: Option<String>,
}

impl Status {
    /// The error message when the status reports a failure.
    ///
    /// An inverted time range is not reported as a failure; the API answers it with an empty
    /// result, which is what callers expect for ranges without data.
    pub fn error(&self) -> Option<&str> {
        let failed = match &self.error_code {
            None => false,
            Some(ErrorCode::Number(code)) => *code != 0,
            Some(ErrorCode::Text(code)) => !code.is_empty() && code != "0",
        };
        let msg = self.error_message.as_deref().filter(|msg| !msg.is_empty());

        match msg {
            Some(START_AFTER_END) => None,
            Some(msg) if failed => Some(msg),
            None if failed => Some("Unknown error"),
            _ => None,
        }
    }
}

/// Response body for [`CoinMarketCap::historical_v1`](super::CoinMarketCap::historical_v1).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HistoricalV1 {
    #[serde(default)]
    pub status: Status,

    /// Quotes keyed by sample time.
    #[serde(default)]
    pub data: BTreeMap<DateTime<Utc>, QuoteV1>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QuoteV1 {
    /// `[price, volume_24h, market_cap]` in USD.
    #[serde(rename = "USD")]
    pub usd: Vec<Decimal>,
}

impl HistoricalV1 {
    /// USD prices in time order. Samples without a price are skipped.
    pub fn points(&self) -> Vec<(DateTime<Utc>, Decimal)> {
        self.data
            .iter()
            .filter_map(|(time, quote)| quote.usd.first().map(|price| (*time, *price)))
            .collect()
    }
}

/// Response body for [`CoinMarketCap::historical_v3`](super::CoinMarketCap::historical_v3).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HistoricalV3 {
    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub data: Option<HistoricalV3Data>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HistoricalV3Data {
    pub id: u32,
    pub name: String,
    pub symbol: String,

    #[serde(default)]
    pub quotes: Vec<QuoteV3>,
}

/// A daily candle.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteV3 {
    pub time_open: DateTime<Utc>,
    pub time_close: DateTime<Utc>,
    pub time_high: DateTime<Utc>,
    pub time_low: DateTime<Utc>,
    pub quote: OhlcV3,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct OhlcV3 {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl HistoricalV3 {
    /// USD prices, four per candle: open, close, high and low, each at its own time.
    ///
    /// The result is not sorted.
    pub fn points(&self) -> Vec<(DateTime<Utc>, Decimal)> {
        self.data
            .iter()
            .flat_map(|data| data.quotes.iter())
            .flat_map(|quote| {
                [
                    (quote.time_open, quote.quote.open),
                    (quote.time_close, quote.quote.close),
                    (quote.time_high, quote.quote.high),
                    (quote.time_low, quote.quote.low),
                ]
            })
            .collect()
    }
}
