//! Currencies and exchange rates
//!
//! Rates are directed: `GEL -> USD` and `USD -> GEL` are stored and looked
//! up independently and are not assumed to be reciprocal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Supported account and transaction currencies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "currency_code", rename_all = "UPPERCASE")]
pub enum Currency {
    Gel,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gel, Currency::Usd, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gel => "GEL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GEL" => Ok(Currency::Gel),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

/// One directed rate: `1 from = rate to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Rates resolved for a single operation.
///
/// Built fresh inside each unit of work from the rate table; never cached
/// across requests. A pair that was not loaded is reported as
/// `ExchangeRateNotFound`, never defaulted.
#[derive(Debug, Clone, Default)]
pub struct RateSheet {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl RateSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        self.insert(from, to, rate);
        self
    }

    pub fn insert(&mut self, from: Currency, to: Currency, rate: Decimal) {
        self.rates.insert((from, to), rate);
    }

    /// Directed rate lookup. Identity conversions never need a stored rate.
    pub fn rate(&self, from: Currency, to: Currency) -> Result<Decimal, DomainError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        match self.rates.get(&(from, to)) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            Some(rate) => Err(DomainError::CorruptExchangeRate {
                from,
                to,
                rate: *rate,
            }),
            None => Err(DomainError::ExchangeRateNotFound { from, to }),
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_codes_round_trip() {
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("GBP".parse::<Currency>().is_err());
    }

    #[test]
    fn test_currency_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"EUR\"");
        let parsed: Currency = serde_json::from_str("\"GEL\"").unwrap();
        assert_eq!(parsed, Currency::Gel);
    }

    #[test]
    fn test_rate_sheet_is_directed() {
        let sheet = RateSheet::new().with_rate(Currency::Usd, Currency::Gel, dec!(2.7));

        assert_eq!(sheet.rate(Currency::Usd, Currency::Gel).unwrap(), dec!(2.7));
        assert_eq!(
            sheet.rate(Currency::Gel, Currency::Usd),
            Err(DomainError::ExchangeRateNotFound {
                from: Currency::Gel,
                to: Currency::Usd
            })
        );
    }

    #[test]
    fn test_rate_sheet_identity() {
        let sheet = RateSheet::new();
        assert_eq!(sheet.rate(Currency::Eur, Currency::Eur).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_rate_sheet_rejects_zero_rate() {
        let sheet = RateSheet::new().with_rate(Currency::Eur, Currency::Gel, Decimal::ZERO);
        assert_eq!(
            sheet.rate(Currency::Eur, Currency::Gel),
            Err(DomainError::CorruptExchangeRate {
                from: Currency::Eur,
                to: Currency::Gel,
                rate: Decimal::ZERO,
            })
        );
    }
}
