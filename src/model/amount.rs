use crate::model::Network;
use rust_decimal::prelude::FromPrimitive as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Mul;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertAmountError {
    /// Unable to parse decimal string.
    #[error("Unable to parse decimal string")]
    Decimal(#[from] rust_decimal::Error),

    /// The JSON number does not fit in a `Decimal`.
    #[error("Number out of range: {0}")]
    OutOfRange(String),
}

/// An amount of the network's native token (DOT or KSM), in whole tokens.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TokenAmount(Decimal);

/// A USD amount. Used both for per-token quotes and for valuations.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct UsdAmount(Decimal);

macro_rules! impl_math_ops {
    ($name:ident) => {
        impl ::std::ops::Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl ::std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl ::std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), |acc, amount| acc + amount)
            }
        }

        impl FromStr for $name {
            type Err = ConvertAmountError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<Decimal> for $name {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Decimal {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Honor the caller's precision, otherwise print without trailing zeros.
                match f.precision() {
                    Some(precision) => {
                        let amount = self.0.round_dp(precision as u32);
                        write!(f, "{amount:.precision$}")
                    }
                    None => write!(f, "{}", self.0.normalize()),
                }
            }
        }
    };
}

impl_math_ops!(TokenAmount);
impl_math_ops!(UsdAmount);

impl TokenAmount {
    /// Convert an on-chain planck balance to whole tokens.
    pub fn from_planck(planck: Decimal, network: Network) -> Self {
        Self(planck / network.planck_divider())
    }

    /// Convert a planck balance decoded from JSON.
    ///
    /// Explorers report balances as integers, but older versions report floats.
    pub fn from_planck_json(
        planck: &serde_json::Number,
        network: Network,
    ) -> Result<Self, ConvertAmountError> {
        let planck = if let Some(planck) = planck.as_u64() {
            Decimal::from(planck)
        } else if let Some(planck) = planck.as_i64() {
            Decimal::from(planck)
        } else {
            planck
                .as_f64()
                .and_then(Decimal::from_f64)
                .ok_or_else(|| ConvertAmountError::OutOfRange(planck.to_string()))?
        };

        Ok(Self::from_planck(planck, network))
    }
}

/// Token amount times its USD quote is a USD value.
impl Mul<UsdAmount> for TokenAmount {
    type Output = UsdAmount;

    fn mul(self, rhs: UsdAmount) -> Self::Output {
        UsdAmount(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_planck() {
        let planck = Decimal::from(15_312_458_312_u64);

        assert_eq!(
            TokenAmount::from_planck(planck, Network::Polkadot),
            "1.5312458312".parse().unwrap()
        );
        assert_eq!(
            TokenAmount::from_planck(planck, Network::Kusama),
            "0.015312458312".parse().unwrap()
        );
    }

    #[test]
    fn test_from_planck_json() {
        let int = serde_json::Number::from(20_000_000_000_u64);
        let float = serde_json::Number::from_f64(25_000_000_000.0).unwrap();

        assert_eq!(
            TokenAmount::from_planck_json(&int, Network::Polkadot).unwrap(),
            "2".parse().unwrap()
        );
        assert_eq!(
            TokenAmount::from_planck_json(&float, Network::Polkadot).unwrap(),
            "2.5".parse().unwrap()
        );
    }

    #[test]
    fn test_usd_value() {
        let amount: TokenAmount = "1.5".parse().unwrap();
        let quote: UsdAmount = "4.2".parse().unwrap();

        assert_eq!(amount * quote, "6.3".parse().unwrap());
    }

    #[test]
    fn test_display() {
        let amount: UsdAmount = "6.30000".parse().unwrap();

        assert_eq!(amount.to_string(), "6.3");
        assert_eq!(format!("{amount:.6}"), "6.300000");
        assert_eq!(format!("{:.2}", "0.125".parse::<UsdAmount>().unwrap()), "0.12");
    }

    #[test]
    fn test_sum() {
        let total: UsdAmount = ["1.25", "2.5", "0.25"]
            .into_iter()
            .map(|s| s.parse::<UsdAmount>().unwrap())
            .sum();

        assert_eq!(total, "4".parse().unwrap());
    }
}
