//! API Integration Tests
//!
//! Run against a migrated database:
//! `DATABASE_URL=... cargo test --features integration_tests -- --test-threads=1`

#![cfg(feature = "integration_tests")]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, SecondsFormat, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use atm_bank::api::routes::{ChangePinRequest, TransferRequest, WithdrawRequest};

mod common;

use common::{
    balance_of, decimal, send, setup_test_db, ALICE_CARD, ALICE_GEL_IBAN, ALICE_USD_IBAN,
    BOB_GEL_IBAN, EXPIRED_CARD,
};

fn withdraw_req(card: &str, amount: &str, currency: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/atm/withdrawals")
        .header("content-type", "application/json")
        .header("X-Roles", "card_holder")
        .header("X-Card-Number", card)
        .body(Body::from(serde_json::to_string(&WithdrawRequest {
            amount: amount.to_string(),
            currency: currency.to_string(),
        }).unwrap()))
        .unwrap()
}

fn transfer_req(user: Uuid, from: &str, to: &str, amount: &str, currency: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/netbank/transactions")
        .header("content-type", "application/json")
        .header("X-Roles", "client")
        .header("X-Request-User-Id", user.to_string())
        .body(Body::from(serde_json::to_string(&TransferRequest {
            sender_iban: from.to_string(),
            receiver_iban: to.to_string(),
            amount: amount.to_string(),
            currency: currency.to_string(),
        }).unwrap()))
        .unwrap()
}

fn report_req(path: &str, currency: Option<&str>) -> Request<Body> {
    let now = Utc::now();
    let from = (now - Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let to = (now + Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut uri = format!("/api/v1/reports/{}?from={}&to={}", path, from, to);
    if let Some(currency) = currency {
        uri.push_str(&format!("&currency={}", currency));
    }

    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Roles", "manager")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_withdrawal_e2e() {
    let seed = setup_test_db().await;
    let app = seed.app();

    // 1. Withdraw 100 GEL: 2 GEL commission
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "100", "GEL")).await;
    assert_eq!(status, StatusCode::CREATED, "Withdrawal failed: {}", json);
    assert_eq!(decimal(&json["debited"]), dec!(102));
    assert_eq!(decimal(&json["balance"]), dec!(898));

    // 2. Balance through the ATM
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/atm/balance")
        .header("X-Roles", "card_holder")
        .header("X-Card-Number", ALICE_CARD)
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&json["balance"]), dec!(898));
    assert_eq!(json["iban"], ALICE_GEL_IBAN);

    // 3. Foreign-currency withdrawal from the GEL account
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "100", "USD")).await;
    assert_eq!(status, StatusCode::CREATED, "USD withdrawal failed: {}", json);
    assert_eq!(decimal(&json["commission"]), dec!(5.4));
    assert_eq!(decimal(&json["debited"]), dec!(275.4));
    assert_eq!(balance_of(&seed.pool, ALICE_GEL_IBAN).await, dec!(622.6));

    // 4. Ledger keeps the requested amount and currency
    let rows: Vec<(String, rust_decimal::Decimal)> =
        sqlx::query_as("SELECT currency::text, amount FROM withdrawals ORDER BY created_at")
            .fetch_all(&seed.pool)
            .await
            .unwrap();
    assert_eq!(rows, vec![("GEL".to_string(), dec!(100)), ("USD".to_string(), dec!(100))]);
}

#[tokio::test]
async fn test_withdrawal_rejections_leave_balance() {
    let seed = setup_test_db().await;
    let app = seed.app();

    let (status, json) = send(&app, withdraw_req(EXPIRED_CARD, "10", "GEL")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "card_expired");

    let (status, json) = send(&app, withdraw_req("4999999999999999", "10", "GEL")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "card_not_found");

    // 990 + 19.8 > 1000
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "990", "GEL")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "insufficient_balance");

    assert_eq!(balance_of(&seed.pool, ALICE_GEL_IBAN).await, dec!(1000));
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM withdrawals")
        .fetch_one(&seed.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_velocity_limit() {
    let seed = setup_test_db().await;
    let app = seed.app();

    sqlx::query("UPDATE accounts SET balance = 20000 WHERE iban = $1")
        .bind(ALICE_GEL_IBAN)
        .execute(&seed.pool)
        .await
        .unwrap();

    let (status, _) = send(&app, withdraw_req(ALICE_CARD, "9000", "GEL")).await;
    assert_eq!(status, StatusCode::CREATED);

    // 9000 + 1000 reaches the 10000 GEL cap
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "1000", "GEL")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "velocity_limit_exceeded");

    // 9000 + 999.99 stays under it
    let (status, _) = send(&app, withdraw_req(ALICE_CARD, "999.99", "GEL")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_velocity_counts_foreign_request_at_face_value() {
    let seed = setup_test_db().await;
    let app = seed.app();

    sqlx::query("UPDATE accounts SET balance = 50000 WHERE iban = $1")
        .bind(ALICE_GEL_IBAN)
        .execute(&seed.pool)
        .await
        .unwrap();

    // 3000 USD is 8100 GEL at the counter, but counts as 3000 against the cap
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "3000", "USD")).await;
    assert_eq!(status, StatusCode::CREATED, "USD withdrawal failed: {}", json);
    assert_eq!(decimal(&json["debited"]), dec!(8262));

    // History is converted: 8100 + 1900 reaches the cap
    let (status, json) = send(&app, withdraw_req(ALICE_CARD, "1900", "GEL")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "velocity_limit_exceeded");
}

#[tokio::test]
async fn test_velocity_holds_across_cards_of_one_owner() {
    let seed = setup_test_db().await;
    let app = seed.app();

    // Second card on Alice's USD account; both accounts well funded
    sqlx::query("UPDATE accounts SET balance = 20000 WHERE user_id = $1")
        .bind(seed.alice)
        .execute(&seed.pool)
        .await
        .unwrap();
    sqlx::query(
        r#"
        INSERT INTO cards (card_number, pin, expires_at, account_id)
        SELECT '4000000000000003', '1234', NOW() + INTERVAL '1 year', id
        FROM accounts WHERE iban = $1
        "#,
    )
    .bind(ALICE_USD_IBAN)
    .execute(&seed.pool)
    .await
    .unwrap();

    // Each is under the cap on its own, together they reach it
    let (first, second) = tokio::join!(
        send(&app, withdraw_req(ALICE_CARD, "6000", "GEL")),
        send(&app, withdraw_req("4000000000000003", "6000", "USD")),
    );

    let mut statuses = [first.0.as_u16(), second.0.as_u16()];
    statuses.sort();
    assert_eq!(
        statuses,
        [StatusCode::CREATED.as_u16(), StatusCode::UNPROCESSABLE_ENTITY.as_u16()],
        "first: {}, second: {}",
        first.1,
        second.1
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM withdrawals WHERE user_id = $1")
        .bind(seed.alice)
        .fetch_one(&seed.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_transfer_e2e() {
    let seed = setup_test_db().await;
    let app = seed.app();

    // 1. Internal: Alice GEL -> Alice USD, no commission
    let (status, json) = send(
        &app,
        transfer_req(seed.alice, ALICE_GEL_IBAN, ALICE_USD_IBAN, "270", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Internal transfer failed: {}", json);
    assert_eq!(json["kind"], "internal");
    assert_eq!(decimal(&json["commission"]), dec!(0));
    assert_eq!(balance_of(&seed.pool, ALICE_GEL_IBAN).await, dec!(730));
    assert_eq!(balance_of(&seed.pool, ALICE_USD_IBAN).await, dec!(599.9));

    // 2. External: Alice GEL -> Bob GEL, 1% + 0.5
    let (status, json) = send(
        &app,
        transfer_req(seed.alice, ALICE_GEL_IBAN, BOB_GEL_IBAN, "100", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "External transfer failed: {}", json);
    assert_eq!(json["kind"], "external");
    assert_eq!(decimal(&json["commission"]), dec!(1.5));
    assert_eq!(balance_of(&seed.pool, ALICE_GEL_IBAN).await, dec!(628.5));
    assert_eq!(balance_of(&seed.pool, BOB_GEL_IBAN).await, dec!(100));
}

#[tokio::test]
async fn test_transfer_rejections() {
    let seed = setup_test_db().await;
    let app = seed.app();

    // Bob may not spend from Alice's account
    let (status, json) = send(
        &app,
        transfer_req(seed.bob, ALICE_GEL_IBAN, BOB_GEL_IBAN, "10", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error_code"], "ownership_violation");

    let (status, json) = send(
        &app,
        transfer_req(seed.alice, ALICE_GEL_IBAN, ALICE_GEL_IBAN, "10", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "same_account_transfer");

    let (status, json) = send(
        &app,
        transfer_req(seed.alice, ALICE_GEL_IBAN, "GE00TT0000000000000099", "10", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "account_not_found");

    let (status, json) = send(
        &app,
        transfer_req(seed.alice, ALICE_GEL_IBAN, BOB_GEL_IBAN, "5000", "GEL"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], "insufficient_balance");

    assert_eq!(balance_of(&seed.pool, ALICE_GEL_IBAN).await, dec!(1000));
    assert_eq!(balance_of(&seed.pool, BOB_GEL_IBAN).await, dec!(0));
}

#[tokio::test]
async fn test_reports_e2e() {
    let seed = setup_test_db().await;
    let app = seed.app();

    for amount in ["100", "200"] {
        let (status, _) = send(
            &app,
            transfer_req(seed.alice, ALICE_GEL_IBAN, BOB_GEL_IBAN, amount, "GEL"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, report_req("transactions/count", None)).await;
    assert_eq!(status, StatusCode::OK, "Report failed: {}", json);
    assert_eq!(json["value"], 2);

    // 300 GEL at 0.37
    let (status, json) = send(&app, report_req("transactions/amount", Some("USD"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&json["value"]), dec!(111));

    // (1.5 + 2.5) / 2
    let (status, json) = send(&app, report_req("transactions/commission-mean", Some("GEL"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&json["value"]), dec!(2));

    // Money metrics need a target currency
    let (status, _) = send(&app, report_req("transactions/amount", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, report_req("withdrawals/count", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], 0);
}

#[tokio::test]
async fn test_pin_and_netbank_views() {
    let seed = setup_test_db().await;
    let app = seed.app();

    let req = Request::builder()
        .method("PATCH")
        .uri("/api/v1/atm/pin")
        .header("content-type", "application/json")
        .header("X-Roles", "card_holder")
        .header("X-Card-Number", ALICE_CARD)
        .body(Body::from(serde_json::to_string(&ChangePinRequest {
            new_pin: "4321".to_string(),
        }).unwrap()))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let pin: String = sqlx::query_scalar("SELECT pin FROM cards WHERE card_number = $1")
        .bind(ALICE_CARD)
        .fetch_one(&seed.pool)
        .await
        .unwrap();
    assert_eq!(pin, "4321");

    let req = Request::builder()
        .method("GET")
        .uri("/api/v1/netbank/accounts")
        .header("X-Roles", "client")
        .header("X-Request-User-Id", seed.alice.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let req = Request::builder()
        .method("GET")
        .uri("/api/v1/netbank/cards")
        .header("X-Roles", "client")
        .header("X-Request-User-Id", seed.alice.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let cards = json.as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|c| !c["card_number"].as_str().unwrap().contains("400000")));

    let req = Request::builder()
        .method("GET")
        .uri("/api/v1/exchange-rates")
        .header("X-Roles", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rates"].as_array().unwrap().len(), 6);
}
