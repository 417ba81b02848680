//! Report Service
//!
//! Runs one rollup against the live tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::{Currency, RateSheet};
use crate::error::AppError;
use crate::repository::{ledger, rates};

use super::{rollup, LedgerKind, Metric, ReportValue};

/// Rollup result returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ledger: LedgerKind,
    pub metric: Metric,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    pub value: ReportValue,
}

#[derive(Debug, Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Compute `metric` over `kind` rows created in `[from, to]`.
    /// Money metrics are expressed in `currency`.
    pub async fn run(
        &self,
        kind: LedgerKind,
        metric: Metric,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        currency: Option<Currency>,
    ) -> Result<Report, AppError> {
        if from > to {
            return Err(AppError::InvalidRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }

        let target = match (metric.is_monetary(), currency) {
            (true, Some(currency)) => Some(currency),
            (true, None) => {
                return Err(AppError::InvalidRequest(format!(
                    "metric '{}' requires a currency",
                    metric
                )))
            }
            (false, _) => None,
        };

        let buckets = ledger::buckets(&self.pool, kind, from, to).await?;

        let sheet = match target {
            Some(_) => rates::load_all(&self.pool).await?,
            None => RateSheet::new(),
        };

        let value = rollup(metric, &buckets, target.unwrap_or(Currency::Gel), &sheet)?;

        tracing::debug!(
            ledger = ?kind,
            %metric,
            buckets = buckets.len(),
            "Report computed"
        );

        Ok(Report {
            ledger: kind,
            metric,
            from,
            to,
            currency: target,
            value,
        })
    }
}
