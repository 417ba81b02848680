//! Exchange-rate refresh
//!
//! Pulls the national bank's daily quotes (GEL per `quantity` units of a
//! foreign currency) and rewrites the six directed pairs among GEL, USD
//! and EUR in one transaction. A quote that is missing or not positive
//! aborts the refresh before anything is written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{round_money, Currency, ExchangeRate};
use crate::repository::{self, rates};

use super::JobError;

/// One day of quotes as published by the feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedDay {
    pub currencies: Vec<FeedQuote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuote {
    pub code: String,
    /// GEL for `quantity` units
    pub rate: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// GEL value of one unit of `currency`
fn gel_per_unit(day: &FeedDay, currency: Currency) -> Result<Decimal, JobError> {
    let quote = day
        .currencies
        .iter()
        .find(|q| q.code.eq_ignore_ascii_case(currency.code()))
        .ok_or_else(|| JobError::Feed(format!("no quote for {}", currency)))?;

    if quote.rate <= Decimal::ZERO || quote.quantity == 0 {
        return Err(JobError::Feed(format!(
            "non-positive quote for {}: {} per {}",
            currency, quote.rate, quote.quantity
        )));
    }

    Ok(quote.rate / Decimal::from(quote.quantity))
}

/// Derive every directed pair among GEL, USD and EUR from one feed day.
/// Each direction is computed on its own, so `a -> b` and `b -> a` are not
/// forced to be exact reciprocals after rounding.
pub fn derive_rates(day: &FeedDay, now: DateTime<Utc>) -> Result<Vec<ExchangeRate>, JobError> {
    let usd = gel_per_unit(day, Currency::Usd)?;
    let eur = gel_per_unit(day, Currency::Eur)?;

    let pairs = [
        (Currency::Usd, Currency::Gel, usd),
        (Currency::Eur, Currency::Gel, eur),
        (Currency::Gel, Currency::Usd, Decimal::ONE / usd),
        (Currency::Gel, Currency::Eur, Decimal::ONE / eur),
        (Currency::Usd, Currency::Eur, usd / eur),
        (Currency::Eur, Currency::Usd, eur / usd),
    ];

    Ok(pairs
        .into_iter()
        .map(|(from, to, rate)| ExchangeRate {
            from,
            to,
            rate: round_money(rate),
            last_updated: now,
        })
        .collect())
}

/// Outcome of one refresh run
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub rates: Vec<ExchangeRate>,
    pub completed_at: DateTime<Utc>,
}

/// Fetches the feed and writes the rate table
#[derive(Debug, Clone)]
pub struct RateRefresher {
    pool: PgPool,
    http: reqwest::Client,
    source_url: String,
}

impl RateRefresher {
    pub fn new(pool: PgPool, source_url: String) -> Self {
        Self {
            pool,
            http: reqwest::Client::new(),
            source_url,
        }
    }

    async fn fetch(&self) -> Result<FeedDay, JobError> {
        let res = self.http.get(&self.source_url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(JobError::Feed(format!("rate source answered {}", status)));
        }

        // The feed wraps the day in a one-element array
        let days: Vec<FeedDay> = res.json().await?;
        days.into_iter()
            .next()
            .ok_or_else(|| JobError::Feed("rate source returned no data".to_string()))
    }

    /// Fetch, derive and upsert once
    pub async fn run_once(&self) -> Result<RefreshReport, JobError> {
        let day = self.fetch().await?;
        let now = Utc::now();
        let derived = derive_rates(&day, now)?;

        let mut tx = repository::begin(&self.pool).await?;
        for rate in &derived {
            rates::upsert(&mut tx, rate.from, rate.to, rate.rate, rate.last_updated).await?;
        }
        repository::commit(tx).await?;

        tracing::info!(pairs = derived.len(), "Exchange rates refreshed");

        Ok(RefreshReport {
            rates: derived,
            completed_at: now,
        })
    }
}
