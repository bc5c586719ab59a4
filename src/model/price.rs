use crate::model::UsdAmount;
use crate::reconcile::{nearest_index, MatchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// USD quote of one token at a point in time.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub usd: UsdAmount,
}

impl PricePoint {
    pub fn new(time: DateTime<Utc>, usd: UsdAmount) -> Self {
        Self { time, usd }
    }
}

/// Price points in non-decreasing time order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    /// Sort the points by time and drop exact duplicates.
    ///
    /// Points sharing a timestamp with different prices are all kept, in their original order.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|point| point.time);
        points.dedup();

        Self(points)
    }

    pub fn as_slice(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.0.iter()
    }

    /// The point closest in time to `target`.
    pub fn nearest(&self, target: DateTime<Utc>) -> Result<&PricePoint, MatchError> {
        let index = nearest_index(&self.0, target)?;

        Ok(&self.0[index])
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(value: PriceSeries) -> Self {
        value.0
    }
}
