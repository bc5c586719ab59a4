//! Reward and price reconciliation.
//!
//! Rewards are listed, timestamped concurrently, grouped into buckets of nearby rewards, and each
//! bucket is matched against one price series fetched for its span.

use crate::client::{BlockResolver, ClientError, PriceProvider, RewardSource};
use crate::model::{constants::QUOTE_PADDING_HOURS, Network, QuotedReward, UnquotedError};
use crate::report::{ReportError, ReportSink};
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, info};

pub use self::bucket::{bucketize, Bucket};
pub use self::nearest::{nearest_between, nearest_index, MatchError};
pub use self::range::{fetch_covering, RangeError};
pub use self::resolve::{resolve_timestamps, ResolveError, TimeFilter};

mod bucket;
mod nearest;
mod range;
mod resolve;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Unable to list rewards for `{account}` on {network}")]
    Rewards {
        account: String,
        network: Network,
        #[source]
        source: ClientError,
    },

    #[error("Block timestamp resolution failed")]
    Resolve(#[from] ResolveError),

    #[error("No rewards in the requested date range")]
    NoRewardsInRange,

    #[error("Unable to fetch USD quotes")]
    Prices(#[from] RangeError),

    #[error("Unable to quote reward at {0}")]
    Quote(DateTime<Utc>, #[source] MatchError),

    #[error("Reward left without a quote")]
    Unquoted(#[from] UnquotedError),

    #[error("Unable to write report")]
    Report(#[from] ReportError),
}

/// Inputs of a reconciliation run.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    pub account: String,
    pub network: Network,

    /// Approximate time between rewards.
    pub era: TimeDelta,

    /// Maximum number of concurrent block timestamp requests.
    pub concurrency: usize,

    pub filter: TimeFilter,
}

/// Value every reward paid to the configured account in USD.
///
/// The result is sorted by reward time.
pub fn reconcile<R, B, P>(
    config: &ReconcileConfig,
    rewards: &R,
    blocks: &B,
    prices: &P,
) -> Result<Vec<QuotedReward>, ReconcileError>
where
    R: RewardSource + ?Sized,
    B: BlockResolver + Sync + ?Sized,
    P: PriceProvider + ?Sized,
{
    let network = config.network;
    let account = &config.account;

    let records = rewards
        .list_rewards(account, network)
        .map_err(|source| ReconcileError::Rewards {
            account: account.clone(),
            network,
            source,
        })?;
    info!("Found {} rewards for `{account}`", records.len());

    let mut records = resolve_timestamps(
        blocks,
        network,
        records,
        config.concurrency,
        &config.filter,
    )?;
    if records.is_empty() {
        return Err(ReconcileError::NoRewardsInRange);
    }

    let padding = TimeDelta::hours(QUOTE_PADDING_HOURS);
    for mut bucket in bucketize(&mut records, config.era) {
        let (Some(start), Some(end)) = (bucket.start(), bucket.end()) else {
            continue;
        };
        debug!("Quoting {} rewards from {start} to {end}", bucket.len());

        let series = fetch_covering(prices, network, start - padding, end + padding)?;
        for reward in bucket.iter_mut() {
            let Some(time) = reward.reward_time else {
                continue;
            };
            let quote = series
                .nearest(time)
                .map_err(|err| ReconcileError::Quote(time, err))?;
            reward.set_quote(quote);
        }
    }

    let quoted = records
        .into_iter()
        .map(QuotedReward::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(quoted)
}

/// Reconcile, then render the report.
///
/// Nothing is rendered unless reconciliation succeeds.
pub fn run<R, B, P, S>(
    config: &ReconcileConfig,
    rewards: &R,
    blocks: &B,
    prices: &P,
    sink: &mut S,
) -> Result<(), ReconcileError>
where
    R: RewardSource + ?Sized,
    B: BlockResolver + Sync + ?Sized,
    P: PriceProvider + ?Sized,
    S: ReportSink + ?Sized,
{
    let quoted = reconcile(config, rewards, blocks, prices)?;
    sink.render(&quoted)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, RewardRecord, TokenAmount, UsdAmount};
    use rust_decimal::Decimal;
    use similar_asserts::assert_eq;
    use tracing_test::traced_test;

    fn date(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// Rewards in blocks `0..count`, one per hour starting at `2021-01-01`.
    struct MockClient {
        count: u64,
        failing_block: Option<u64>,
        quotes: Vec<PricePoint>,
    }

    impl MockClient {
        fn new(count: u64) -> Self {
            Self {
                count,
                failing_block: None,
                quotes: Vec::new(),
            }
        }

        fn block_time(block_id: u64) -> DateTime<Utc> {
            date("2021-01-01T00:00:00Z") + TimeDelta::hours(block_id as i64)
        }
    }

    impl RewardSource for MockClient {
        fn list_rewards(
            &self,
            account: &str,
            _network: Network,
        ) -> Result<Vec<RewardRecord>, ClientError> {
            if self.count == 0 {
                return Err(ClientError::NoRewards(account.to_string()));
            }

            // Newest first, like the explorer.
            Ok((0..self.count)
                .rev()
                .map(|block_id| {
                    RewardRecord::new(block_id, TokenAmount::from(Decimal::from(block_id)))
                })
                .collect())
        }
    }

    impl BlockResolver for MockClient {
        fn block_timestamp(
            &self,
            _network: Network,
            block_id: u64,
        ) -> Result<DateTime<Utc>, ClientError> {
            if self.failing_block == Some(block_id) {
                return Err(ClientError::Api("Internal server error".to_string()));
            }

            Ok(Self::block_time(block_id))
        }
    }

    impl PriceProvider for MockClient {
        fn historical_prices(
            &self,
            _network: Network,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PricePoint>, ClientError> {
            Ok(self
                .quotes
                .iter()
                .filter(|quote| quote.time >= start && quote.time <= end)
                .copied()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        renders: Vec<Vec<QuotedReward>>,
    }

    impl ReportSink for RecordingSink {
        fn render(&mut self, rewards: &[QuotedReward]) -> Result<(), ReportError> {
            self.renders.push(rewards.to_vec());

            Ok(())
        }
    }

    fn config(era_hours: i64) -> ReconcileConfig {
        ReconcileConfig {
            account: "13UVJyLnbVp9RBZYFwFGyDvVd1y27Tt8tkntv6Q7JVPhFsTB".to_string(),
            network: Network::Polkadot,
            era: TimeDelta::hours(era_hours),
            concurrency: 10,
            filter: TimeFilter::default(),
        }
    }

    fn usd(s: &str) -> UsdAmount {
        s.parse().unwrap()
    }

    #[test]
    #[traced_test]
    fn test_reconcile() {
        let _ = tracing_log::LogTracer::init();

        let mut client = MockClient::new(3);
        client.quotes = vec![
            PricePoint::new(date("2021-01-01T02:00:00Z"), usd("5.0")),
            PricePoint::new(date("2020-12-31T23:00:00Z"), usd("4.0")),
            PricePoint::new(date("2021-01-01T01:00:00Z"), usd("4.5")),
        ];

        let quoted = reconcile(&config(1), &client, &client, &client).unwrap();

        let summary = quoted
            .iter()
            .map(|reward| (reward.block_id, reward.quote_time, reward.usd_value()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (0, date("2020-12-31T23:00:00Z"), usd("0")),
                (1, date("2021-01-01T01:00:00Z"), usd("4.5")),
                (2, date("2021-01-01T02:00:00Z"), usd("10.0")),
            ]
        );
        assert!(logs_contain("Found 3 rewards"));
    }

    #[test]
    fn test_one_price_query_per_bucket() {
        struct CountingPrices(parking_lot::Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>);

        impl PriceProvider for CountingPrices {
            fn historical_prices(
                &self,
                _network: Network,
                start: DateTime<Utc>,
                end: DateTime<Utc>,
            ) -> Result<Vec<PricePoint>, ClientError> {
                self.0.lock().push((start, end));

                Ok(vec![PricePoint::new(start, "1".parse().unwrap())])
            }
        }

        let client = MockClient::new(4);
        let prices = CountingPrices(Default::default());
        let mut config = config(1);
        config.filter.end = Some(MockClient::block_time(1));

        reconcile(&config, &client, &client, &prices).unwrap();

        // Blocks 0 and 1 share a bucket, padded by a day on both sides.
        assert_eq!(
            *prices.0.lock(),
            vec![(date("2020-12-31T00:00:00Z"), date("2021-01-02T01:00:00Z"))]
        );
    }

    #[test]
    fn test_no_rewards_in_range() {
        let client = MockClient::new(5);
        let mut config = config(24);
        config.filter.start = Some(date("2022-01-01T00:00:00Z"));

        let err = reconcile(&config, &client, &client, &client).unwrap_err();

        assert!(matches!(err, ReconcileError::NoRewardsInRange));
    }

    #[test]
    fn test_no_rewards() {
        let client = MockClient::new(0);

        let err = reconcile(&config(24), &client, &client, &client).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Rewards {
                network: Network::Polkadot,
                source: ClientError::NoRewards(_),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_quotes() {
        let client = MockClient::new(2);

        let err = reconcile(&config(24), &client, &client, &client).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Quote(time, MatchError::NoMatch(_)) if time == MockClient::block_time(0)
        ));
    }

    #[test]
    fn test_failed_block_renders_nothing() {
        let mut client = MockClient::new(50);
        client.failing_block = Some(23);
        client.quotes = vec![PricePoint::new(date("2021-01-01T00:00:00Z"), usd("4.0"))];
        let mut sink = RecordingSink::default();

        let err = run(&config(24), &client, &client, &client, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Resolve(ResolveError::Block { block_id: 23, .. })
        ));
        assert!(sink.renders.is_empty());
    }

    #[test]
    fn test_table_on_stdout_with_worker_logs() {
        // Worker threads log to stdout while the table sink for stdout is alive.
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(std::io::stdout)
                .with_max_level(tracing::Level::INFO)
                .with_ansi(false)
                .finish();

            let result = tracing::subscriber::with_default(subscriber, || {
                let mut client = MockClient::new(20);
                client.quotes = vec![PricePoint::new(date("2021-01-01T00:00:00Z"), usd("4.0"))];
                let mut config = config(24);
                config.concurrency = 4;
                let mut sink = crate::report::sink_for(None, Network::Polkadot);

                run(&config, &client, &client, &client, sink.as_mut())
            });
            let _ = tx.send(result.is_ok());
        });

        let finished = rx.recv_timeout(std::time::Duration::from_secs(15));
        assert_eq!(finished, Ok(true));
    }

    #[test]
    fn test_run_renders_once() {
        let mut client = MockClient::new(50);
        client.quotes = vec![PricePoint::new(date("2021-01-01T00:00:00Z"), usd("4.0"))];
        let mut sink = RecordingSink::default();

        run(&config(24), &client, &client, &client, &mut sink).unwrap();

        assert_eq!(sink.renders.len(), 1);
        assert_eq!(sink.renders[0].len(), 50);
        assert!(sink.renders[0]
            .windows(2)
            .all(|pair| pair[0].reward_time <= pair[1].reward_time));
    }
}
