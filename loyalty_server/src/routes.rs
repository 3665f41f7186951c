//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, any long, non-cpu-bound operation (database
//! access, calls to the accrual service) must be expressed as a future so that the worker can interleave requests.
use actix_web::{get, http::header, post, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    db_types::OrderNumber,
    helpers::luhn_valid,
    AuthApi,
    InsertOrderResult,
    LedgerApi,
    SqliteDatabase,
};
use serde_json::json;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{Credentials, OrderResult, WithdrawalRequest, WithdrawalResult},
    errors::ServerError,
};

/// Route handler for the health check endpoint
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Route handler for `POST /api/user/register`.
///
/// A successful registration logs the user in immediately: the response carries the bearer token both in the
/// `Authorization` header and in the body.
#[post("/register")]
pub async fn register(
    body: web::Json<Credentials>,
    auth_api: web::Data<AuthApi<SqliteDatabase>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login: login_input, password } = body.into_inner();
    let login_input = login_input.trim().to_string();
    if login_input.is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody("login and password must both be non-empty".to_string()));
    }
    let user = auth_api.register(&login_input, &password).await?;
    let token = issuer.issue(&user)?;
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .json(json!({ "token": token })))
}

/// Route handler for `POST /api/user/login`.
#[post("/login")]
pub async fn login(
    body: web::Json<Credentials>,
    auth_api: web::Data<AuthApi<SqliteDatabase>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login: login_input, password } = body.into_inner();
    let user = auth_api.authenticate(login_input.trim(), &password).await?;
    let token = issuer.issue(&user)?;
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .json(json!({ "token": token })))
}

/// Route handler for `POST /api/user/orders`. The body is the bare order number as `text/plain`.
#[post("/orders")]
pub async fn submit_order(
    body: String,
    claims: JwtClaims,
    ledger: web::Data<LedgerApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    if !luhn_valid(number) {
        return Err(ServerError::InvalidOrderNumber(number.to_string()));
    }
    let number = OrderNumber::from(number.to_string());
    match ledger.submit_order(number, claims.sub).await? {
        InsertOrderResult::Inserted(_) => Ok(HttpResponse::Accepted().finish()),
        InsertOrderResult::AlreadyUploaded(_) => Ok(HttpResponse::Ok().finish()),
        InsertOrderResult::OwnedByAnotherUser(number) => Err(ServerError::OrderConflict(number.to_string())),
    }
}

/// Route handler for `GET /api/user/orders`.
#[get("/orders")]
pub async fn my_orders(
    claims: JwtClaims,
    ledger: web::Data<LedgerApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let orders = ledger.orders_for_user(claims.sub).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders: Vec<OrderResult> = orders.into_iter().map(OrderResult::from).collect();
    Ok(HttpResponse::Ok().json(orders))
}

/// Route handler for `GET /api/user/balance`.
#[get("/balance")]
pub async fn balance(
    claims: JwtClaims,
    ledger: web::Data<LedgerApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let summary = ledger.balance_for_user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Route handler for `POST /api/user/balance/withdraw`.
#[post("/balance/withdraw")]
pub async fn withdraw(
    body: web::Json<WithdrawalRequest>,
    claims: JwtClaims,
    ledger: web::Data<LedgerApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    let number = order.trim();
    if !luhn_valid(number) {
        return Err(ServerError::InvalidOrderNumber(number.to_string()));
    }
    let new_balance = ledger.withdraw(claims.sub, OrderNumber::from(number.to_string()), sum).await?;
    debug!("💻️ {} withdrew {sum}. New balance: {new_balance}", claims.login);
    Ok(HttpResponse::Ok().finish())
}

/// Route handler for `GET /api/user/withdrawals`.
#[get("/withdrawals")]
pub async fn withdrawals(
    claims: JwtClaims,
    ledger: web::Data<LedgerApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let history = ledger.withdrawals_for_user(claims.sub).await?;
    if history.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let history: Vec<WithdrawalResult> = history.into_iter().map(WithdrawalResult::from).collect();
    Ok(HttpResponse::Ok().json(history))
}
