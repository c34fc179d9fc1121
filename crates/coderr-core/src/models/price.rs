// ABOUTME: Fixed-point package price stored as integer cents
// ABOUTME: Parses decimal strings or JSON numbers and renders two decimal places
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::constants::limits::PRICE_MAX_DIGITS;

/// Why a price failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// Not a decimal number at all
    Invalid,
    /// More than two fractional digits
    TooManyDecimalPlaces,
    /// More digits than the column allows
    TooManyDigits,
}

impl PriceError {
    /// Client-facing validation message
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Invalid => "A valid number is required.",
            Self::TooManyDecimalPlaces => "Ensure that there are no more than 2 decimal places.",
            Self::TooManyDigits => "Ensure that there are no more than 10 digits in total.",
        }
    }
}

/// Monetary amount with two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Build from an amount in cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount as a float, used where the API renders prices as JSON numbers
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse a price from a JSON string or number
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] when the value is not a decimal with at most two places
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n.to_string().parse(),
            _ => Err(PriceError::Invalid),
        }
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = trimmed
            .strip_prefix('-')
            .map_or((false, trimmed), |rest| (true, rest));
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 2 {
            return Err(PriceError::TooManyDecimalPlaces);
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() + 2 > PRICE_MAX_DIGITS {
            return Err(PriceError::TooManyDigits);
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::Invalid)?
        };
        let fraction_value: i64 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| PriceError::Invalid)?;

        let cents = whole_value * 100 + fraction_value;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
