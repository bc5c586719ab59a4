use crate::client::{ClientError, PriceProvider};
use crate::model::{constants::QUOTE_BACKOFF_HOURS, Network, PriceSeries};
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("Unable to fetch {network} quotes from {start} to {end}")]
    Fetch {
        network: Network,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        #[source]
        source: ClientError,
    },
}

/// Fetch price points covering `[lower, upper]`.
///
/// Providers cap the number of points per response and keep the most recent ones, so the query
/// window walks backward until the earliest point reaches `lower` or the provider runs dry. The
/// result may extend past either bound.
pub fn fetch_covering<P>(
    provider: &P,
    network: Network,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
) -> Result<PriceSeries, RangeError>
where
    P: PriceProvider + ?Sized,
{
    let backoff = TimeDelta::hours(QUOTE_BACKOFF_HOURS);
    let mut points = Vec::new();
    let mut end = upper;
    let mut previous: Option<DateTime<Utc>> = None;

    while end >= lower {
        let batch = provider
            .historical_prices(network, lower, end)
            .map_err(|source| RangeError::Fetch {
                network,
                start: lower,
                end,
                source,
            })?;

        let Some(earliest) = batch.iter().map(|point| point.time).min() else {
            debug!("No quotes before {end}");
            break;
        };
        points.extend(batch);

        if earliest <= lower {
            break;
        }
        if previous.is_some_and(|previous| earliest >= previous) {
            warn!("Quotes before {end} stopped moving back at {earliest}");
            break;
        }

        debug!("Quotes truncated at {earliest}, moving back");
        previous = Some(earliest);
        end = earliest - backoff;
    }

    Ok(PriceSeries::from_unsorted(points))
}
