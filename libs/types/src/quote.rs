//! Oracle price quote
//!
//! A `PriceQuote` is the ephemeral output of one oracle read: a
//! mantissa/exponent price, a confidence band, and the publish time.
//! Quotes are produced fresh per validation call and never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scale;

/// A single timestamped price observation from the oracle.
///
/// `price` and `confidence` share the same exponent, mirroring the
/// oracle wire format: `value = mantissa × 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price mantissa
    pub price: i64,
    /// Confidence band mantissa (one-sided width)
    pub confidence: u64,
    /// Power-of-ten exponent applied to both mantissas
    pub exponent: i32,
    /// Unix time (seconds) the quote was published
    pub publish_time: i64,
}

impl PriceQuote {
    /// Construct a quote from raw oracle fields.
    pub fn new(price: i64, confidence: u64, exponent: i32, publish_time: i64) -> Self {
        Self {
            price,
            confidence,
            exponent,
            publish_time,
        }
    }

    /// Price with the exponent applied.
    pub fn price_decimal(&self) -> Decimal {
        scale::scaled_decimal(self.price, self.exponent)
    }

    /// Confidence band with the exponent applied. Mantissas above
    /// `i64::MAX` clamp; a band that wide is already past any
    /// acceptance threshold.
    pub fn confidence_decimal(&self) -> Decimal {
        let mantissa = i64::try_from(self.confidence).unwrap_or(i64::MAX);
        scale::scaled_decimal(mantissa, self.exponent)
    }

    /// Age of this quote relative to `now` (seconds). Negative if the
    /// publish time is in the future.
    pub fn age_seconds(&self, now: i64) -> i64 {
        now - self.publish_time
    }
}
