//! Currency types and ARS/USD conversion.
//!
//! Expenses are recorded in their native currency and converted for display
//! only. The ARS-per-USD rate is fetched from the Frankfurter API (ECB data)
//! and refreshed in the background; request handlers only ever read the
//! shared [ExchangeRates] value.

use std::{
    collections::HashMap,
    fmt::{self, Display},
    sync::{Arc, RwLock},
    time::Duration,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Deserialize;

use crate::Error;

/// The currencies an expense can be recorded in and displayed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// Argentine peso.
    Ars,
}

impl Currency {
    /// The ISO 4217 code for the currency.
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Ars => "ARS",
        }
    }

    /// Parse an ISO 4217 code, e.g. from a database row or form value.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "USD" => Some(Self::Usd),
            "ARS" => Some(Self::Ars),
            _ => None,
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.code().into())
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        Currency::from_code(code).ok_or(FromSqlError::InvalidType)
    }
}

/// Exchange rates used to convert expense amounts for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRates {
    ars_per_usd: f64,
}

impl ExchangeRates {
    /// The rate used until the first successful fetch.
    pub const FALLBACK_ARS_PER_USD: f64 = 1000.0;

    /// Create exchange rates with the given ARS-per-USD rate.
    pub fn new(ars_per_usd: f64) -> Self {
        Self { ars_per_usd }
    }

    /// Convert `amount` from one currency to another.
    ///
    /// Conversion between the same currency is the identity.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        match (from, to) {
            (Currency::Ars, Currency::Usd) => amount / self.ars_per_usd,
            (Currency::Usd, Currency::Ars) => amount * self.ars_per_usd,
            _ => amount,
        }
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::new(Self::FALLBACK_ARS_PER_USD)
    }
}

const RATES_URL: &str = "https://api.frankfurter.dev/latest?from=USD&to=ARS";

const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

async fn fetch_ars_per_usd(client: &reqwest::Client) -> Result<f64, Error> {
    let response = client
        .get(RATES_URL)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::ExchangeRateError(error.to_string()))?;

    let rates: RatesResponse = response
        .json()
        .await
        .map_err(|error| Error::ExchangeRateError(error.to_string()))?;

    rates
        .rates
        .get("ARS")
        .copied()
        .ok_or_else(|| Error::ExchangeRateError("response did not include an ARS rate".to_owned()))
}

/// Spawn a background task that fetches the ARS/USD rate now and then hourly.
///
/// A failed fetch logs a warning and keeps the previous rate, so readers of
/// `rates` always see a usable value.
pub fn spawn_rate_refresh(rates: Arc<RwLock<ExchangeRates>>) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();

        loop {
            match fetch_ars_per_usd(&client).await {
                Ok(ars_per_usd) => match rates.write() {
                    Ok(mut guard) => {
                        *guard = ExchangeRates::new(ars_per_usd);
                        tracing::info!("updated exchange rate: {ars_per_usd} ARS per USD");
                    }
                    Err(error) => {
                        tracing::error!("could not lock exchange rates for writing: {error}");
                    }
                },
                Err(error) => {
                    tracing::warn!("could not refresh exchange rates, keeping previous: {error}");
                }
            }

            tokio::time::sleep(REFRESH_INTERVAL).await;
        }
    });
}
