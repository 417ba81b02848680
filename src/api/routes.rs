//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{Amount, CardNumber, Currency, ExchangeRate, Iban, OperationContext, Pin};
use crate::error::AppError;
use crate::handlers::{
    AccountView, BalanceResult, CardHandler, CardView, ChangePinCommand, NetBankHandler,
    TransferCommand, TransferHandler, TransferResult, WithdrawCommand, WithdrawResult,
    WithdrawalHandler,
};
use crate::jobs::RefreshReport;
use crate::reports::{LedgerKind, Metric, Report, ReportService};
use crate::repository::rates;

use super::middleware::{
    require_back_office, require_card_holder, require_client, CARD_NUMBER_HEADER, USER_ID_HEADER,
};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePinRequest {
    pub new_pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExchangeRatesResponse {
    pub rates: Vec<ExchangeRate>,
}

fn parse_amount(value: &str) -> Result<Amount, AppError> {
    value
        .parse()
        .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {}", e)))
}

fn parse_currency(value: &str) -> Result<Currency, AppError> {
    value
        .parse()
        .map_err(|e| AppError::InvalidRequest(format!("{}", e)))
}

fn parse_iban(value: &str) -> Result<Iban, AppError> {
    value
        .parse()
        .map_err(|e| AppError::InvalidRequest(format!("{}", e)))
}

fn session_card(context: &OperationContext) -> Result<CardNumber, AppError> {
    context
        .card_number
        .clone()
        .ok_or_else(|| AppError::MissingHeader(CARD_NUMBER_HEADER.to_string()))
}

fn session_user(context: &OperationContext) -> Result<uuid::Uuid, AppError> {
    context
        .request_user_id
        .ok_or_else(|| AppError::MissingHeader(USER_ID_HEADER.to_string()))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Each group carries its own capability check.
pub fn create_router() -> Router<AppState> {
    let atm = Router::new()
        .route("/atm/balance", post(get_balance))
        .route("/atm/pin", patch(change_pin))
        .route("/atm/withdrawals", post(withdraw))
        .route_layer(middleware::from_fn(require_card_holder));

    let netbank = Router::new()
        .route("/netbank/accounts", get(list_accounts))
        .route("/netbank/cards", get(list_cards))
        .route("/netbank/transactions", post(transfer))
        .route_layer(middleware::from_fn(require_client));

    let back_office = Router::new()
        .route("/reports/:ledger/:metric", get(report))
        .route("/exchange-rates", get(list_rates))
        .route("/exchange-rates/refresh", post(refresh_rates))
        .route_layer(middleware::from_fn(require_back_office));

    Router::new().merge(atm).merge(netbank).merge(back_office)
}

// =========================================================================
// POST /atm/balance
// =========================================================================

/// Balance of the account behind the session card
async fn get_balance(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<BalanceResult>, AppError> {
    let card = session_card(&context)?;
    let result = CardHandler::new(pool).balance(&card, &context).await?;
    Ok(Json(result))
}

// =========================================================================
// PATCH /atm/pin
// =========================================================================

async fn change_pin(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<ChangePinRequest>,
) -> Result<StatusCode, AppError> {
    let card = session_card(&context)?;
    let pin = Pin::parse(&request.new_pin).map_err(|e| AppError::InvalidRequest(e.to_string()))?;

    CardHandler::new(pool)
        .change_pin(ChangePinCommand::new(card, pin), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// POST /atm/withdrawals
// =========================================================================

async fn withdraw(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<WithdrawResult>), AppError> {
    let card = session_card(&context)?;
    let command = WithdrawCommand::new(
        card,
        parse_amount(&request.amount)?,
        parse_currency(&request.currency)?,
    );

    let result = WithdrawalHandler::new(pool).execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

// =========================================================================
// GET /netbank/accounts, GET /netbank/cards
// =========================================================================

async fn list_accounts(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<Vec<AccountView>>, AppError> {
    let user_id = session_user(&context)?;
    Ok(Json(NetBankHandler::new(pool).accounts(user_id).await?))
}

async fn list_cards(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<Vec<CardView>>, AppError> {
    let user_id = session_user(&context)?;
    Ok(Json(NetBankHandler::new(pool).cards(user_id).await?))
}

// =========================================================================
// POST /netbank/transactions
// =========================================================================

async fn transfer(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResult>), AppError> {
    let user_id = session_user(&context)?;

    let command = TransferCommand::new(
        parse_iban(&request.sender_iban)?,
        parse_iban(&request.receiver_iban)?,
        parse_amount(&request.amount)?,
        parse_currency(&request.currency)?,
        user_id,
    );

    let result = TransferHandler::new(pool).execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

// =========================================================================
// GET /reports/:ledger/:metric
// =========================================================================

async fn report(
    State(pool): State<PgPool>,
    Path((ledger, metric)): Path<(String, String)>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    let ledger: LedgerKind = ledger.parse().map_err(AppError::InvalidRequest)?;
    let metric: Metric = metric.parse().map_err(AppError::InvalidRequest)?;
    let currency = query.currency.as_deref().map(parse_currency).transpose()?;

    let report = ReportService::new(pool)
        .run(ledger, metric, query.from, query.to, currency)
        .await?;

    Ok(Json(report))
}

// =========================================================================
// GET /exchange-rates, POST /exchange-rates/refresh
// =========================================================================

async fn list_rates(State(pool): State<PgPool>) -> Result<Json<ExchangeRatesResponse>, AppError> {
    let rates = rates::list(&pool).await?;
    Ok(Json(ExchangeRatesResponse { rates }))
}

async fn refresh_rates(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<RefreshReport>, AppError> {
    let refresher = state
        .rate_refresher
        .ok_or(AppError::NotConfigured("RATE_SOURCE_URL"))?;

    tracing::info!(
        user = ?context.request_user_id,
        correlation_id = ?context.correlation_id,
        "Manual exchange rate refresh"
    );

    Ok(Json(refresher.run_once().await?))
}
