//! CoinMarketCap historical quote APIs. The main type is the [`CoinMarketCap`] client.
//!
//! Two unrelated API shapes are supported, because the public endpoints have changed over time:
//!
//! - [`CoinMarketCap::historical_v1`]: `v1.1/cryptocurrency/quotes/historical` returns a map of
//!   timestamps to quotes, sampled at a caller-provided interval.
//! - [`CoinMarketCap::historical_v3`]: `data-api/v3/cryptocurrency/historical` returns daily OHLC
//!   candles, each with the time of its open, close, high and low.

pub use self::types::{ErrorCode, HistoricalV1, HistoricalV3, HistoricalV3Data};
pub use self::types::{OhlcV3, QuoteV1, QuoteV3, Status};
use crate::{append_path_and_query, base_request, Error, Req};
use chrono::{DateTime, Utc};
use http::Uri;

mod types;

/// Default endpoint for [`CoinMarketCap::historical_v1`].
pub const V1_ENDPOINT: &str = "https://web-api.coinmarketcap.com/v1.1/cryptocurrency/quotes/historical";

/// Default endpoint for [`CoinMarketCap::historical_v3`].
pub const V3_ENDPOINT: &str = "https://api.coinmarketcap.com/data-api/v3/cryptocurrency/historical";

/// CoinMarketCap ID for USD conversions.
pub const USD_CONVERT_ID: u32 = 2781;

/// Status message returned with an empty result when the requested range is inverted.
pub const START_AFTER_END: &str = r#""time_start" must be older than "time_end"."#;

/// The main CoinMarketCap client.
///
/// Each client is bound to a single endpoint, so a separate client is needed for each API shape.
#[derive(Clone, Debug)]
pub struct CoinMarketCap {
    req: Req,
}

impl CoinMarketCap {
    /// CoinMarketCap client constructor.
    ///
    /// The API endpoint string must be a valid absolute [`Uri`].
    ///
    /// # Example
    ///
    /// ```
    /// # use explorda::coinmarketcap::{CoinMarketCap, V3_ENDPOINT};
    /// # fn main() -> anyhow::Result<()> {
    /// let cmc = CoinMarketCap::new(V3_ENDPOINT)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<U>(api: U) -> Result<Self, Error>
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<http::Error>,
    {
        Ok(Self {
            req: base_request(api)?,
        })
    }

    /// Get USD quotes for asset `id` sampled every `interval_hours` between `start` and `end`.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client.
    ///
    /// The response can be deserialized from JSON into a [`HistoricalV1`].
    pub fn historical_v1(
        &self,
        id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_hours: i64,
    ) -> Result<Req, Error> {
        let query = [
            ("convert", "USD,BTC".to_string()),
            ("format", "chart_crypto_details".to_string()),
            ("id", id.to_string()),
            ("interval", format!("{interval_hours}h")),
            ("time_start", start.timestamp().to_string()),
            ("time_end", end.timestamp().to_string()),
        ];
        let mut req = self.req.clone();
        append_path_and_query(&mut req, "", &query)?;

        Ok(req)
    }

    /// Get daily USD OHLC candles for asset `id` between `start` and `end`.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client.
    ///
    /// The response can be deserialized from JSON into a [`HistoricalV3`].
    pub fn historical_v3(
        &self,
        id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Req, Error> {
        let query = [
            ("id", id.to_string()),
            ("convertId", USD_CONVERT_ID.to_string()),
            ("timeStart", start.timestamp().to_string()),
            ("timeEnd", end.timestamp().to_string()),
        ];
        let mut req = self.req.clone();
        append_path_and_query(&mut req, "", &query)?;

        Ok(req)
    }
}
