// ABOUTME: Domain enums and value types shared by storage and HTTP layers
// ABOUTME: Profile types, package tiers, order status, prices, and wire datetime format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

/// Fixed-point package prices
pub mod price;

pub use price::{Price, PriceError};

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::formats::DATETIME_FORMAT;

/// Marketplace role attached to a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    /// Orders packages and writes reviews
    Customer,
    /// Publishes offers and fulfils orders
    Business,
}

impl ProfileType {
    /// Every accepted value
    pub const ALL: [Self; 2] = [Self::Customer, Self::Business];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Business => "business",
        }
    }

    /// Parse from database or request string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl Display for ProfileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package tier within an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    /// Entry package
    Basic,
    /// Middle package
    Standard,
    /// Top package
    Premium,
}

impl OfferType {
    /// Every accepted value
    pub const ALL: [Self; 3] = [Self::Basic, Self::Standard, Self::Premium];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

    /// Parse from database or request string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl Display for OfferType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfilment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed and being worked on
    #[default]
    InProgress,
    /// Delivered
    Completed,
    /// Abandoned by either party
    Cancelled,
}

impl OrderStatus {
    /// Every accepted value
    pub const ALL: [Self; 3] = [Self::InProgress, Self::Completed, Self::Cancelled];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from database or request string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a timestamp in the API's wire format (`2025-01-31T09:30:00Z`)
#[must_use]
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Serde helper for `#[serde(serialize_with = "wire_datetime")]`
///
/// # Errors
///
/// Propagates serializer failures
pub fn wire_datetime<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(DATETIME_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_enum_round_trip_through_strings() {
        assert_eq!(ProfileType::parse("business"), Some(ProfileType::Business));
        assert_eq!(ProfileType::parse("admin"), None);
        assert_eq!(OfferType::parse("premium"), Some(OfferType::Premium));
        assert_eq!(OrderStatus::parse("in_progress"), Some(OrderStatus::InProgress));
        assert_eq!(OrderStatus::default().as_str(), "in_progress");
    }

    #[test]
    fn test_datetime_wire_format_drops_fraction() {
        let ts = Utc
            .with_ymd_and_hms(2025, 3, 9, 14, 5, 7)
            .single()
            .unwrap_or_default();
        assert_eq!(format_datetime(&ts), "2025-03-09T14:05:07Z");
    }
}
