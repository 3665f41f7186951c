//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Every multi-step write runs inside one `sqlx` transaction; the ledger invariants (no negative balance,
//! no split commits, no double credit) hang off that.
use std::fmt::Debug;

use log::*;
use lp_common::Points;
use sqlx::SqlitePool;

use super::db::{self, balance, orders, users};
use crate::{
    db_types::{BalanceSummary, NewOrder, NewUser, NewWithdrawal, Order, OrderNumber, OrderStatusType, User, Withdrawal},
    traits::{
        AccrualDecision,
        AuthApiError,
        CommitOutcome,
        InsertOrderResult,
        LedgerDatabase,
        LedgerError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `LOYALTY_DATABASE_URL` environment variable, or the default path.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = db::new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database file if it does not exist yet. Call before [`Self::new_with_url`] on first boot.
    pub async fn create_database_if_missing(url: &str) -> Result<(), sqlx::Error> {
        use sqlx::migrate::MigrateDatabase;
        if !sqlx::Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist yet. Creating it.");
            sqlx::Sqlite::create_database(url).await?;
        }
        Ok(())
    }

    /// Brings the schema up to date. Run once at startup, before serving traffic.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        db::run_migrations(&self.pool).await
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_reconcilable_orders(&self, limit: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::reconcilable_orders(limit, &mut conn).await?;
        Ok(orders)
    }

    async fn commit_decision(
        &self,
        order_id: i64,
        owner: i64,
        decision: &AccrualDecision,
    ) -> Result<CommitOutcome, LedgerError> {
        if decision.status == OrderStatusType::New {
            return Err(LedgerError::InvalidDecision(
                "a reward decision can never return an order to NEW".to_string(),
            ));
        }
        let mut tx = self.pool.begin().await?;
        let updated = orders::apply_decision(order_id, decision.status, decision.accrual, &mut tx).await?;
        let outcome = match updated {
            Some(order) => {
                if order.status == OrderStatusType::Processed {
                    let new_balance = balance::apply_delta(owner, decision.accrual, &mut tx).await?;
                    debug!(
                        "🗃️ Order {} reached PROCESSED. {} credited to user #{owner}, balance is now {new_balance}",
                        order.number, decision.accrual
                    );
                } else {
                    trace!("🗃️ Order {} moved to {}", order.number, order.status);
                }
                CommitOutcome::Applied(order)
            },
            None => {
                // The guard filtered the row out: either the order is terminal, or the id is stale.
                let order = orders::fetch_order_by_id(order_id, &mut tx)
                    .await?
                    .ok_or(LedgerError::OrderIdNotFound(order_id))?;
                trace!("🗃️ Order {} is already {}. Leaving it untouched", order.number, order.status);
                CommitOutcome::AlreadyFinal(order)
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn balance_for_user(&self, user_id: i64) -> Result<BalanceSummary, LedgerError> {
        // One transaction so `current` and `withdrawn` come from the same snapshot.
        let mut tx = self.pool.begin().await?;
        let current = balance::current_balance(user_id, &mut tx).await?;
        let withdrawn = balance::withdrawn_total(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(BalanceSummary { current, withdrawn })
    }

    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Points, LedgerError> {
        let mut tx = self.pool.begin().await?;
        balance::insert_withdrawal(&withdrawal, &mut tx).await?;
        // An InsufficientFunds error propagates here, dropping `tx` and rolling the withdrawal row back with it.
        let new_balance = balance::apply_delta(withdrawal.user_id, -withdrawal.sum, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ User #{} withdrew {} against order {}. Balance is now {new_balance}",
            withdrawal.user_id, withdrawal.sum, withdrawal.order_number
        );
        Ok(new_balance)
    }

    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = balance::withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::fetch_user_by_login(login, &mut conn).await
    }
}
