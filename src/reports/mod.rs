//! Reporting rollups
//!
//! Read-only aggregations over the withdrawal and transaction ledgers.
//! The SQL side groups rows into per-day, per-currency buckets; the
//! functions here convert and fold them into the requested figure.

mod service;

pub use service::{Report, ReportService};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::{round_money, Currency, DomainError, RateSheet};

/// Which ledger a report reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Transactions,
    Withdrawals,
}

impl FromStr for LedgerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transactions" => Ok(LedgerKind::Transactions),
            "withdrawals" => Ok(LedgerKind::Withdrawals),
            other => Err(format!("unknown ledger: {}", other)),
        }
    }
}

/// Figure computed over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Count,
    CountByDay,
    Amount,
    AmountMean,
    Commission,
    CommissionMean,
}

impl Metric {
    /// Money metrics need a target currency and the rate table
    pub fn is_monetary(&self) -> bool {
        !matches!(self, Metric::Count | Metric::CountByDay)
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Metric::Count),
            "count-by-day" => Ok(Metric::CountByDay),
            "amount" => Ok(Metric::Amount),
            "amount-mean" => Ok(Metric::AmountMean),
            "commission" => Ok(Metric::Commission),
            "commission-mean" => Ok(Metric::CommissionMean),
            other => Err(format!("unknown metric: {}", other)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Count => "count",
            Metric::CountByDay => "count-by-day",
            Metric::Amount => "amount",
            Metric::AmountMean => "amount-mean",
            Metric::Commission => "commission",
            Metric::CommissionMean => "commission-mean",
        };
        f.write_str(name)
    }
}

/// Ledger rows sharing a UTC day and currencies
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerBucket {
    pub day: NaiveDate,
    /// Currency of `amount`
    pub currency: Currency,
    /// Currency of `commission`
    pub commission_currency: Currency,
    pub count: i64,
    pub amount: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Count(i64),
    CountByDay(BTreeMap<NaiveDate, i64>),
    Money(Decimal),
}

pub fn count(buckets: &[LedgerBucket]) -> i64 {
    buckets.iter().map(|b| b.count).sum()
}

pub fn count_by_day(buckets: &[LedgerBucket]) -> BTreeMap<NaiveDate, i64> {
    buckets.iter().fold(BTreeMap::new(), |mut days, b| {
        *days.entry(b.day).or_insert(0) += b.count;
        days
    })
}

/// Sum of amounts converted with `currency -> target`
pub fn amount_sum(
    buckets: &[LedgerBucket],
    target: Currency,
    rates: &RateSheet,
) -> Result<Decimal, DomainError> {
    let total = buckets.iter().try_fold(Decimal::ZERO, |acc, b| {
        Ok::<_, DomainError>(acc + b.amount * rates.rate(b.currency, target)?)
    })?;
    Ok(round_money(total))
}

/// Sum of commissions converted with `commission_currency -> target`
pub fn commission_sum(
    buckets: &[LedgerBucket],
    target: Currency,
    rates: &RateSheet,
) -> Result<Decimal, DomainError> {
    let total = buckets.iter().try_fold(Decimal::ZERO, |acc, b| {
        Ok::<_, DomainError>(acc + b.commission * rates.rate(b.commission_currency, target)?)
    })?;
    Ok(round_money(total))
}

/// Mean of a sum over `count` rows; zero for an empty window
pub fn mean(sum: Decimal, count: i64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    round_money(sum / Decimal::from(count))
}

/// Compute one metric over pre-grouped buckets
pub fn rollup(
    metric: Metric,
    buckets: &[LedgerBucket],
    target: Currency,
    rates: &RateSheet,
) -> Result<ReportValue, DomainError> {
    let value = match metric {
        Metric::Count => ReportValue::Count(count(buckets)),
        Metric::CountByDay => ReportValue::CountByDay(count_by_day(buckets)),
        Metric::Amount => ReportValue::Money(amount_sum(buckets, target, rates)?),
        Metric::AmountMean => {
            ReportValue::Money(mean(amount_sum(buckets, target, rates)?, count(buckets)))
        }
        Metric::Commission => ReportValue::Money(commission_sum(buckets, target, rates)?),
        Metric::CommissionMean => {
            ReportValue::Money(mean(commission_sum(buckets, target, rates)?, count(buckets)))
        }
    };
    Ok(value)
}
