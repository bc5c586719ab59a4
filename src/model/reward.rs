use crate::model::{PricePoint, TokenAmount, UsdAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnquotedError {
    #[error("Reward in block {0} has no timestamp")]
    NoTimestamp(u64),

    #[error("Reward in block {0} has no USD quote")]
    NoQuote(u64),
}

/// A staking reward as it moves through reconciliation.
///
/// Created by a [`RewardSource`](crate::client::RewardSource) with only the block number and
/// amount. The reward time is filled in by timestamp resolution, and the quote by nearest-quote
/// matching.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RewardRecord {
    pub block_id: u64,
    pub amount: TokenAmount,
    pub reward_time: Option<DateTime<Utc>>,
    pub quote_time: Option<DateTime<Utc>>,
    pub quote_value: Option<UsdAmount>,
}

impl RewardRecord {
    pub fn new(block_id: u64, amount: TokenAmount) -> Self {
        Self {
            block_id,
            amount,
            reward_time: None,
            quote_time: None,
            quote_value: None,
        }
    }

    pub(crate) fn set_quote(&mut self, quote: &PricePoint) {
        self.quote_time = Some(quote.time);
        self.quote_value = Some(quote.usd);
    }
}

/// A fully valued reward, ready for reporting.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QuotedReward {
    pub block_id: u64,
    pub reward_time: DateTime<Utc>,
    pub amount: TokenAmount,
    pub quote_time: DateTime<Utc>,
    pub quote_value: UsdAmount,
}

impl QuotedReward {
    /// Value of the reward in USD at the quoted price.
    pub fn usd_value(&self) -> UsdAmount {
        self.amount * self.quote_value
    }
}

impl TryFrom<RewardRecord> for QuotedReward {
    type Error = UnquotedError;

    fn try_from(value: RewardRecord) -> Result<Self, Self::Error> {
        let reward_time = value
            .reward_time
            .ok_or(UnquotedError::NoTimestamp(value.block_id))?;
        let (quote_time, quote_value) = value
            .quote_time
            .zip(value.quote_value)
            .ok_or(UnquotedError::NoQuote(value.block_id))?;

        Ok(Self {
            block_id: value.block_id,
            reward_time,
            amount: value.amount,
            quote_time,
            quote_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_reward() {
        let mut record = RewardRecord::new(42, "1.5".parse().unwrap());
        assert!(matches!(
            QuotedReward::try_from(record.clone()),
            Err(UnquotedError::NoTimestamp(42))
        ));

        record.reward_time = Some("2021-01-01T06:00:00Z".parse().unwrap());
        assert!(matches!(
            QuotedReward::try_from(record.clone()),
            Err(UnquotedError::NoQuote(42))
        ));

        let quote = PricePoint::new("2021-01-01T00:00:00Z".parse().unwrap(), "4.2".parse().unwrap());
        record.set_quote(&quote);
        let quoted = QuotedReward::try_from(record).unwrap();

        assert_eq!(quoted.quote_time, quote.time);
        assert_eq!(quoted.usd_value(), "6.3".parse().unwrap());
    }
}
