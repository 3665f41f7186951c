use std::time::Duration;

use accrual_client::{AccrualApi, AccrualConfig};
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{AuthApi, LedgerApi, SqliteDatabase};
use tokio::sync::watch;

use crate::{
    accrual_worker::start_accrual_worker,
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::accrual::RewardsAdapter,
    routes::{balance, health, login, my_orders, register, submit_order, withdraw, withdrawals},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_database_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let accrual_api = AccrualApi::new(AccrualConfig::new(&config.accrual_url))
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker =
        start_accrual_worker(db.clone(), RewardsAdapter::new(accrual_api), config.reconciliation, shutdown_rx);

    let srv = create_server_instance(config, db)?;
    let result = srv.await;

    // The HTTP server has stopped (ctrl-c or fatal error); wind the pipeline down with it.
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        warn!("💻️ The reconciliation worker did not shut down cleanly: {e}");
    }
    result.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let token_issuer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lps::access_log"))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(token_issuer))
            .service(health)
            .service(
                web::scope("/api/user")
                    .service(register)
                    .service(login)
                    .service(submit_order)
                    .service(my_orders)
                    .service(balance)
                    .service(withdraw)
                    .service(withdrawals),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
