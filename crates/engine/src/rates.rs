//! Exchange-rate sources and the currency normalizer.
//!
//! The normalizer converts submitted amounts into the company's base
//! currency. Rate lookups degrade rather than fail: if the source is
//! unreachable or has no rate for the target, the original amount is kept
//! so submission never blocks on a third-party outage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use outlay_core::currency::{RateTable, convert_amount};
use outlay_shared::CurrencyCode;
use outlay_shared::config::RateSourceConfig;

/// Errors from a rate source lookup.
#[derive(Debug, Error)]
pub enum RateSourceError {
    /// Transport-level failure (timeout, DNS, TLS, malformed body).
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("rate source returned status {0}")]
    Status(u16),

    /// The source has no table for the requested base currency.
    #[error("no rates available for base currency {0}")]
    Missing(CurrencyCode),
}

/// A provider of exchange-rate tables, one table per base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the latest rate table quoted against `base`.
    async fn latest(&self, base: &CurrencyCode) -> Result<RateTable, RateSourceError>;
}

/// Wire shape of the external rate API response.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: HashMap<String, Decimal>,
}

/// Rate source backed by an HTTP rate API (`GET {base_url}/{code}`).
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    /// Builds a source from configuration, with a bounded request timeout.
    pub fn new(config: &RateSourceConfig) -> Result<Self, RateSourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateTable, RateSourceError> {
        let url = format!("{}/{}", self.base_url, base);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateSourceError::Status(status.as_u16()));
        }
        let payload: RatesPayload = response.json().await?;
        Ok(RateTable {
            base: base.clone(),
            rates: payload.rates,
        })
    }
}

/// A fixed rate source for tests and offline embedding.
#[derive(Default)]
pub struct StaticRateSource {
    table: Option<RateTable>,
}

impl StaticRateSource {
    /// A source that always serves the given table.
    #[must_use]
    pub fn new(table: RateTable) -> Self {
        Self { table: Some(table) }
    }

    /// A source with no rates at all; every lookup fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateTable, RateSourceError> {
        match &self.table {
            Some(table) if table.base == *base => Ok(table.clone()),
            _ => Err(RateSourceError::Missing(base.clone())),
        }
    }
}

/// Converts amounts to a target currency, falling back to the original
/// amount when no rate can be obtained.
pub struct CurrencyNormalizer {
    source: Arc<dyn RateSource>,
}

impl CurrencyNormalizer {
    /// Creates a normalizer over the given rate source.
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source }
    }

    /// Converts `amount` from `from` to `to`.
    ///
    /// Same-currency conversions return the amount unchanged without
    /// touching the source. On source failure or a missing rate the
    /// original amount is returned and a warning is logged.
    pub async fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> Decimal {
        if from == to {
            return amount;
        }
        match self.source.latest(from).await {
            Ok(table) => match table.rate_for(to) {
                Some(rate) => convert_amount(amount, rate),
                None => {
                    warn!(%from, %to, "rate table has no entry for target; keeping original amount");
                    amount
                }
            },
            Err(err) => {
                warn!(%from, %to, error = %err, "rate lookup failed; keeping original amount");
                amount
            }
        }
    }
}
