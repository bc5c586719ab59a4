use super::{new_agent, ClientError, PriceProvider};
use crate::model::{constants::HTTP_TIMEOUT_SECS, Network, PricePoint};
use chrono::{DateTime, TimeDelta, Utc};
use explorda::coinmarketcap::{CoinMarketCap, HistoricalV1, HistoricalV3, Status};
use explorda::coinmarketcap::{V1_ENDPOINT, V3_ENDPOINT};
use rust_decimal::Decimal;
use std::{fmt, str::FromStr, time::Duration, time::Instant};
use thiserror::Error;
use tracing::{info, trace};
use ureq::Agent;

#[derive(Debug, Error)]
pub enum CoinMarketCapClientError {
    #[error("Invalid CoinMarketCap URI")]
    CoinMarketCapUri(#[from] explorda::Error),

    #[error("Unknown quotes API `{0}`. Try one of: `v3`, `v1`")]
    QuotesApi(String),
}

/// CoinMarketCap API shapes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum QuotesApi {
    /// Quotes sampled at the era interval.
    V1,

    /// Daily OHLC candles.
    #[default]
    V3,
}

impl FromStr for QuotesApi {
    type Err = CoinMarketCapClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v3" => Ok(Self::V3),
            _ => Err(CoinMarketCapClientError::QuotesApi(s.to_string())),
        }
    }
}

impl fmt::Display for QuotesApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V3 => f.write_str("v3"),
        }
    }
}

/// A CoinMarketCap historical quotes client.
pub struct CoinMarketCapClient {
    agent: Agent,
    cmc: CoinMarketCap,
    api: QuotesApi,
    interval_hours: i64,
}

impl CoinMarketCapClient {
    /// Create a client for the given API shape.
    ///
    /// `era` sets the sampling interval of the v1 API, in whole hours.
    pub fn new(api: QuotesApi, era: TimeDelta) -> Result<Self, CoinMarketCapClientError> {
        let endpoint = match api {
            QuotesApi::V1 => V1_ENDPOINT,
            QuotesApi::V3 => V3_ENDPOINT,
        };

        Self::with_endpoint(api, endpoint, era)
    }

    /// Create a client for the given API shape served from a custom endpoint.
    pub fn with_endpoint(
        api: QuotesApi,
        endpoint: &str,
        era: TimeDelta,
    ) -> Result<Self, CoinMarketCapClientError> {
        Ok(Self {
            // CoinMarketCap reports an empty range as a 400 with a status body.
            agent: new_agent(1, Duration::from_secs(HTTP_TIMEOUT_SECS), false),
            cmc: CoinMarketCap::new(endpoint)?,
            api,
            interval_hours: era.num_hours().max(1),
        })
    }
}

impl PriceProvider for CoinMarketCapClient {
    fn historical_prices(
        &self,
        network: Network,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ClientError> {
        let id = network.coinmarketcap_id();

        info!("Fetching {} quotes from {start} to {end}", network.symbol());

        let started = Instant::now();
        let points = match self.api {
            QuotesApi::V1 => {
                let req = self.cmc.historical_v1(id, start, end, self.interval_hours)?;
                let mut resp = self.agent.run(req)?;
                let hist: HistoricalV1 = resp.body_mut().read_json()?;
                trace!("{hist:#?}");

                price_points(&hist.status, hist.points())?
            }
            QuotesApi::V3 => {
                let req = self.cmc.historical_v3(id, start, end)?;
                let mut resp = self.agent.run(req)?;
                let hist: HistoricalV3 = resp.body_mut().read_json()?;
                trace!("{hist:#?}");

                price_points(&hist.status, hist.points())?
            }
        };
        let dur = started.elapsed();

        info!("{} quotes received in {dur:?}", points.len());

        Ok(points)
    }
}

fn price_points(
    status: &Status,
    points: Vec<(DateTime<Utc>, Decimal)>,
) -> Result<Vec<PricePoint>, ClientError> {
    if let Some(msg) = status.error() {
        return Err(ClientError::Api(msg.to_string()));
    }

    Ok(points
        .into_iter()
        .map(|(time, usd)| PricePoint::new(time, usd.into()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorda::coinmarketcap::ErrorCode;

    #[test]
    fn test_parse_quotes_api() {
        assert_eq!("v1".parse::<QuotesApi>().unwrap(), QuotesApi::V1);
        assert_eq!("V3".parse::<QuotesApi>().unwrap(), QuotesApi::V3);
        assert_eq!(QuotesApi::default(), QuotesApi::V3);
        assert!("v2".parse::<QuotesApi>().is_err());
    }

    #[test]
    fn test_price_points() {
        let time: DateTime<Utc> = "2021-01-01T00:00:00Z".parse().unwrap();
        let points = vec![(time, "8.75".parse().unwrap())];

        assert_eq!(
            price_points(&Status::default(), points).unwrap(),
            vec![PricePoint::new(time, "8.75".parse().unwrap())]
        );
    }

    #[test]
    fn test_empty_range_is_not_an_error() {
        let hist: HistoricalV1 = serde_json::from_str(
            r#"{
                "status": {
                    "error_code": 400,
                    "error_message": "\"time_start\" must be older than \"time_end\"."
                },
                "data": {}
            }"#,
        )
        .unwrap();

        assert!(price_points(&hist.status, hist.points()).unwrap().is_empty());
    }

    #[test]
    fn test_api_error() {
        let status = Status {
            error_code: Some(ErrorCode::Number(1006)),
            error_message: Some("Your plan is not authorized".to_string()),
        };

        assert!(matches!(
            price_points(&status, vec![]),
            Err(ClientError::Api(msg)) if msg == "Your plan is not authorized"
        ));
    }

    #[test]
    fn test_interval_is_at_least_one_hour() {
        let client =
            CoinMarketCapClient::new(QuotesApi::V1, TimeDelta::minutes(30)).unwrap();

        assert_eq!(client.interval_hours, 1);
    }
}
