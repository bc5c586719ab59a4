use crate::model::RewardRecord;
use chrono::{DateTime, TimeDelta, Utc};

/// A contiguous run of time-sorted rewards that can share one price query.
#[derive(Debug)]
pub struct Bucket<'a> {
    rewards: &'a mut [RewardRecord],
}

impl Bucket<'_> {
    /// Time of the first reward.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.rewards.first().and_then(|reward| reward.reward_time)
    }

    /// Time of the last reward.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.rewards.last().and_then(|reward| reward.reward_time)
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn as_slice(&self) -> &[RewardRecord] {
        self.rewards
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RewardRecord> {
        self.rewards.iter_mut()
    }
}

/// Split time-sorted rewards into buckets.
///
/// A new bucket starts wherever two neighbors are more than `era + era / 10` apart. Rewards
/// without a timestamp always end up in a bucket of their own.
pub fn bucketize(
    rewards: &mut [RewardRecord],
    era: TimeDelta,
) -> impl Iterator<Item = Bucket<'_>> {
    let tolerance = era + era / 10;

    rewards
        .chunk_by_mut(move |a, b| match (a.reward_time, b.reward_time) {
            (Some(a), Some(b)) => b - a <= tolerance,
            _ => false,
        })
        .map(|rewards| Bucket { rewards })
}
