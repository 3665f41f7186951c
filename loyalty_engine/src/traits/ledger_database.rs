use lp_common::Points;
use thiserror::Error;

use crate::{
    db_types::{BalanceSummary, NewOrder, NewWithdrawal, Order, OrderNumber, Withdrawal},
    traits::{AccrualDecision, CommitOutcome, InsertOrderResult},
};

/// The storage contract for the order ledger and point balances.
///
/// Implementations must guarantee that every method runs its writes inside a single atomic transaction. In
/// particular:
/// * [`LedgerDatabase::withdraw`] persists the withdrawal record and the balance debit together, or not at all.
/// * [`LedgerDatabase::commit_decision`] writes the order's status change and (for a `Processed` decision) the
///   balance credit together, or not at all.
/// * A balance may never be observably negative after a commit.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a newly submitted order with status `NEW`. Idempotent: resubmission by the same owner is reported as
    /// [`InsertOrderResult::AlreadyUploaded`], a submission of a number owned by someone else as
    /// [`InsertOrderResult::OwnedByAnotherUser`].
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;

    /// All orders uploaded by the given user, most recent first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;

    /// Up to `limit` orders still awaiting a reward decision (status `NEW` or `PROCESSING`), oldest first so that
    /// early submissions cannot be starved. Terminal orders are never returned.
    async fn fetch_reconcilable_orders(&self, limit: i64) -> Result<Vec<Order>, LedgerError>;

    /// Applies a reward decision to the order with internal id `order_id`, owned by `owner`.
    ///
    /// The status write carries a `WHERE status IN ('NEW', 'PROCESSING')` guard, so an order that already reached
    /// a terminal state is left untouched and reported as [`CommitOutcome::AlreadyFinal`]. Committing the same
    /// decision twice credits exactly once.
    async fn commit_decision(
        &self,
        order_id: i64,
        owner: i64,
        decision: &AccrualDecision,
    ) -> Result<CommitOutcome, LedgerError>;

    /// The user's current balance and lifetime withdrawn total, read in one consistent snapshot.
    async fn balance_for_user(&self, user_id: i64) -> Result<BalanceSummary, LedgerError>;

    /// Debits the user's balance and records the withdrawal in one transaction. Returns the new balance.
    /// Fails with [`LedgerError::InsufficientFunds`] (and no state change at all) if the debit would push the
    /// balance below zero.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Points, LedgerError>;

    /// The user's withdrawal history, most recent first.
    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The balance does not cover the requested debit")]
    InsufficientFunds,
    #[error("Withdrawal sums must be positive. {0} is not")]
    InvalidAmount(Points),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The decision cannot be applied to an order: {0}")]
    InvalidDecision(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
