use crate::client::{BlockResolver, ClientError};
use crate::model::{Network, RewardRecord};
use crate::util::progress::Progress;
use chrono::{DateTime, Utc};
use rayon::{prelude::*, ThreadPoolBuilder};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Rayon thread pool error")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Unable to resolve timestamp of {network} block {block_id}")]
    Block {
        network: Network,
        block_id: u64,
        #[source]
        source: ClientError,
    },
}

/// Inclusive date bounds on reward times. Missing bounds are open.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TimeFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeFilter {
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| time >= start) && self.end.is_none_or(|end| time <= end)
    }
}

/// Resolve the timestamp of every reward with at most `concurrency` requests in flight.
///
/// Rewards outside of `filter` are dropped, and the rest are returned sorted by time. The first
/// resolver error aborts the whole batch.
pub fn resolve_timestamps<B>(
    resolver: &B,
    network: Network,
    mut rewards: Vec<RewardRecord>,
    concurrency: usize,
    filter: &TimeFilter,
) -> Result<Vec<RewardRecord>, ResolveError>
where
    B: BlockResolver + Sync + ?Sized,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("block-resolver-{i}"))
        .build()?;
    let progress = Progress::new("Block timestamps", rewards.len());

    debug!(
        "Resolving {} block timestamps on {concurrency} threads",
        rewards.len()
    );

    // Workers log to the caller's subscriber, which may be scoped to the calling thread.
    let dispatch = tracing::dispatcher::get_default(|dispatch| dispatch.clone());

    // Each worker owns one record at a time. `install` returns once every worker is done.
    pool.install(|| {
        rewards.par_iter_mut().try_for_each(|reward| {
            tracing::dispatcher::with_default(&dispatch, || {
                let time = resolver
                    .block_timestamp(network, reward.block_id)
                    .map_err(|source| ResolveError::Block {
                        network,
                        block_id: reward.block_id,
                        source,
                    })?;
                reward.reward_time = Some(time);
                progress.tick();

                Ok::<_, ResolveError>(())
            })
        })
    })?;

    let total = rewards.len();
    rewards.retain(|reward| reward.reward_time.is_some_and(|time| filter.contains(time)));
    rewards.sort_unstable_by_key(|reward| reward.reward_time);

    debug!("{} of {total} rewards within {filter:?}", rewards.len());

    Ok(rewards)
}
