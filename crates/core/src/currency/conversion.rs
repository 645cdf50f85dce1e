//! Rate tables and conversion arithmetic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use outlay_shared::CurrencyCode;

/// A rate table keyed by target currency code, as returned by the external
/// rate source for one base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    /// The base currency the rates are quoted against.
    pub base: CurrencyCode,
    /// Target currency code → rate (1 base = rate target).
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Creates an empty rate table for a base currency.
    #[must_use]
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: HashMap::new(),
        }
    }

    /// Adds a rate (builder style, used by tests and static sources).
    #[must_use]
    pub fn with_rate(mut self, to: impl Into<CurrencyCode>, rate: Decimal) -> Self {
        self.rates.insert(to.into().as_str().to_string(), rate);
        self
    }

    /// Looks up the rate toward a target currency.
    #[must_use]
    pub fn rate_for(&self, to: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(to.as_str()).copied()
    }
}

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to 4 decimal places to
/// minimize cumulative errors.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate).round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven)
}
