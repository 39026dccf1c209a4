//! Whole-unit prices.
//!
//! The boutique prices everything in whole rupees, so a price is a plain
//! non-negative integer. There is no minor unit and no rounding anywhere.

use core::fmt;
use std::iter::Sum;

use serde::{Deserialize, Deserializer, Serialize};

/// Currency label shown next to every price.
pub const CURRENCY_LABEL: &str = "PKR";

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty or whitespace.
    #[error("price is required")]
    Empty,
    /// The input is not a whole, non-negative number.
    #[error("price must be a whole number, got {0:?}")]
    NotAWholeNumber(String),
    /// The input does not fit the supported range.
    #[error("price is too large")]
    TooLarge,
}

/// A price in whole currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(u32);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from whole units.
    #[must_use]
    pub const fn new(units: u32) -> Self {
        Self(units)
    }

    /// Whole units.
    #[must_use]
    pub const fn units(self) -> u32 {
        self.0
    }

    /// Parse admin form input.
    ///
    /// Only ASCII digits (after trimming) are accepted, so `"12.5"`, `"-3"`
    /// and `"1e3"` are all rejected instead of being coerced.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when the input is blank, not a whole number, or
    /// larger than `u32::MAX`.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::NotAWholeNumber(trimmed.to_owned()));
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| PriceError::TooLarge)
    }

    /// Add two prices, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Format with thousands separators and the currency label, e.g. `PKR 1,500`.
    #[must_use]
    pub fn display_with_currency(self) -> String {
        format!("{CURRENCY_LABEL} {self}")
    }
}

impl fmt::Display for Price {
    /// Formats with thousands separators (`1500` → `1,500`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        f.write_str(&out)
    }
}

impl From<u32> for Price {
    fn from(units: u32) -> Self {
        Self(units)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        Self::from(price.0)
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(PriceError::NotAWholeNumber(value.to_string()));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| PriceError::TooLarge)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Rows written by older clients carry the price as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PriceRepr::deserialize(deserializer)? {
            PriceRepr::Number(n) => Self::try_from(n).map_err(serde::de::Error::custom),
            PriceRepr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
