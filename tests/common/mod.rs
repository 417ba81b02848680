//! Common test utilities

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use atm_bank::api::{self, AppState};

pub const ALICE_GEL_IBAN: &str = "GE00TT0000000000000001";
pub const ALICE_USD_IBAN: &str = "GE00TT0000000000000002";
pub const BOB_GEL_IBAN: &str = "GE00TT0000000000000003";
pub const ALICE_CARD: &str = "4000000000000001";
pub const EXPIRED_CARD: &str = "4000000000000002";

/// Seeded identities
pub struct Seed {
    pub pool: PgPool,
    pub alice: Uuid,
    pub bob: Uuid,
}

impl Seed {
    pub fn app(&self) -> Router {
        api::build_router(AppState::new(self.pool.clone()))
    }
}

/// Setup test database - truncate tables and seed test data
///
/// Alice owns a GEL account (1000) with a live card and a USD account (500).
/// Bob owns a GEL account (0). All six rates among GEL, USD and EUR exist.
pub async fn setup_test_db() -> Seed {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    // Clean up DB for fresh state
    sqlx::query("TRUNCATE TABLE transactions, withdrawals, cards, accounts, exchange_rates CASCADE")
        .execute(&mut *tx)
        .await
        .expect("Failed to clean up DB");

    let accounts = [
        (alice, ALICE_GEL_IBAN, "1000", "GEL"),
        (alice, ALICE_USD_IBAN, "500", "USD"),
        (bob, BOB_GEL_IBAN, "0", "GEL"),
    ];
    let mut alice_gel_account = Uuid::nil();
    for (user_id, iban, balance, currency) in accounts {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (user_id, iban, balance, currency)
            VALUES ($1, $2, $3::numeric, $4::currency_code)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(iban)
        .bind(balance)
        .bind(currency)
        .fetch_one(&mut *tx)
        .await
        .expect("Failed to seed account");

        if iban == ALICE_GEL_IBAN {
            alice_gel_account = id;
        }
    }

    let now = Utc::now();
    for (card_number, expires_at) in [
        (ALICE_CARD, now + Duration::days(365)),
        (EXPIRED_CARD, now - Duration::days(1)),
    ] {
        sqlx::query(
            "INSERT INTO cards (card_number, pin, expires_at, account_id) VALUES ($1, '1234', $2, $3)",
        )
        .bind(card_number)
        .bind(expires_at)
        .bind(alice_gel_account)
        .execute(&mut *tx)
        .await
        .expect("Failed to seed card");
    }

    let rates = [
        ("USD", "GEL", "2.7"),
        ("GEL", "USD", "0.37"),
        ("EUR", "GEL", "3"),
        ("GEL", "EUR", "0.33"),
        ("USD", "EUR", "0.9"),
        ("EUR", "USD", "1.1"),
    ];
    for (from, to, rate) in rates {
        sqlx::query(
            r#"
            INSERT INTO exchange_rates (from_currency, to_currency, rate)
            VALUES ($1::currency_code, $2::currency_code, $3::numeric)
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(rate)
        .execute(&mut *tx)
        .await
        .expect("Failed to seed exchange rate");
    }

    tx.commit().await.expect("Failed to commit transaction");

    Seed { pool, alice, bob }
}

/// Send one request and decode the JSON body (Null for empty bodies)
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Read a decimal field serialized as a string
pub fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

pub async fn balance_of(pool: &PgPool, iban: &str) -> Decimal {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE iban = $1")
        .bind(iban)
        .fetch_one(pool)
        .await
        .unwrap()
}
