//! Database module
//!
//! Connectivity and schema checks. The schema itself lives in the
//! raw SQL files under migrations/.

use sqlx::PgPool;

/// Tables the engines read and write
pub const REQUIRED_TABLES: &[&str] = &[
    "accounts",
    "cards",
    "exchange_rates",
    "withdrawals",
    "transactions",
];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    // Engines refuse to price without rates, so warn early
    let rate_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exchange_rates")
        .fetch_one(pool)
        .await?;
    if rate_count == 0 {
        tracing::warn!("exchange_rates is empty; cross-currency operations will be rejected");
    }

    Ok(true)
}
