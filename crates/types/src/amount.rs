//! Ether-denominated amounts carried as integer wei.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wei per ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

const WEI_DECIMALS: usize = 18;

/// Errors from parsing a decimal ether amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("Amount is empty")]
    Empty,

    #[error("Malformed amount: {0}")]
    Malformed(String),

    #[error("Amount is negative")]
    Negative,

    #[error("Amount has more than 18 decimal places")]
    TooPrecise,

    #[error("Amount out of range")]
    Overflow,
}

/// A non-negative value in wei.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Amount {
    wei: u128,
}

impl Amount {
    pub const ZERO: Amount = Amount { wei: 0 };

    pub const fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    pub const fn wei(&self) -> u128 {
        self.wei
    }

    pub fn is_positive(&self) -> bool {
        self.wei > 0
    }

    /// Parse decimal ether text such as `"2.75"` into wei.
    pub fn parse_ether(text: &str) -> Result<Self, AmountParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AmountParseError::Empty);
        }

        // Decimal rounds beyond 28 fractional digits; wei has 18
        if let Some((_, frac)) = text.split_once('.') {
            let significant = frac.trim_end_matches('0');
            if significant.len() > WEI_DECIMALS
                && significant.chars().all(|c| c.is_ascii_digit())
            {
                return Err(AmountParseError::TooPrecise);
            }
        }

        let ether =
            Decimal::from_str(text).map_err(|e| AmountParseError::Malformed(e.to_string()))?;
        if ether.is_zero() {
            return Ok(Self::ZERO);
        }
        if ether.is_sign_negative() {
            return Err(AmountParseError::Negative);
        }

        let wei = ether
            .checked_mul(Decimal::from(WEI_PER_ETHER as u64))
            .ok_or(AmountParseError::Overflow)?;
        if !wei.fract().is_zero() {
            return Err(AmountParseError::TooPrecise);
        }

        wei.to_u128()
            .map(Self::from_wei)
            .ok_or(AmountParseError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_ETHER;
        let frac = self.wei % WEI_PER_ETHER;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:018}", frac);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({} ETH)", self)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_ether(s)
    }
}

// Wei travels as a decimal string so JSON consumers never lose precision.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wei.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse::<u128>()
            .map(Self::from_wei)
            .map_err(serde::de::Error::custom)
    }
}
