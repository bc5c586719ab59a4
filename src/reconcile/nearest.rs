use crate::model::PricePoint;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub enum MatchError {
    #[error("No price point near {0}")]
    NoMatch(DateTime<Utc>),
}

/// Find the index of the point closest in time to `target` in a time-sorted series.
pub fn nearest_index(series: &[PricePoint], target: DateTime<Utc>) -> Result<usize, MatchError> {
    match series.len() {
        0 => Err(MatchError::NoMatch(target)),
        len => nearest_between(series, target, 0, len - 1),
    }
}

/// Find the index of the point closest in time to `target` within `series[low..=high]`.
///
/// The series must be sorted by time. On equal distances the lower index wins, and when several
/// points share the winning timestamp the first of them is returned.
pub fn nearest_between(
    series: &[PricePoint],
    target: DateTime<Utc>,
    low: usize,
    high: usize,
) -> Result<usize, MatchError> {
    if low > high || high >= series.len() {
        return Err(MatchError::NoMatch(target));
    }

    let first = low;
    let (mut low, mut high) = (low, high);
    let mut index = loop {
        if low == high {
            break low;
        }
        if high - low == 1 {
            let to_low = distance(series[low].time, target);
            let to_high = distance(series[high].time, target);
            break if to_low <= to_high { low } else { high };
        }

        let mid = low + (high - low) / 2;
        if series[mid].time > target {
            high = mid;
        } else {
            low = mid;
        }
    };

    while index > first && series[index - 1].time == series[index].time {
        index -= 1;
    }

    Ok(index)
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> TimeDelta {
    if a > b {
        a - b
    } else {
        b - a
    }
}
