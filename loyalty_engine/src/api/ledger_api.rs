use std::fmt::Debug;

use log::*;
use lp_common::Points;

use crate::{
    db_types::{BalanceSummary, NewOrder, NewWithdrawal, Order, OrderNumber, Withdrawal},
    traits::{InsertOrderResult, LedgerDatabase, LedgerError},
};

/// `LedgerApi` is the primary API for order submission and the per-user point ledger.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: LedgerDatabase
{
    /// Submit an order number for reward calculation on behalf of `user_id`.
    ///
    /// The submission is idempotent for the owning user. The caller is responsible for validating the number's
    /// format (check digit etc.) before calling; the ledger only cares about uniqueness.
    pub async fn submit_order(&self, number: OrderNumber, user_id: i64) -> Result<InsertOrderResult, LedgerError> {
        let result = self.db.insert_order(NewOrder::new(number, user_id)).await?;
        match &result {
            InsertOrderResult::Inserted(order) => {
                debug!("🔄️📦️ Order {} accepted for user #{user_id}", order.number);
            },
            InsertOrderResult::AlreadyUploaded(order) => {
                debug!("🔄️📦️ Order {} was already uploaded by user #{user_id}. Nothing to do", order.number);
            },
            InsertOrderResult::OwnedByAnotherUser(number) => {
                info!("🔄️📦️ User #{user_id} tried to claim order {number}, which belongs to someone else");
            },
        }
        Ok(result)
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        self.db.orders_for_user(user_id).await
    }

    pub async fn balance_for_user(&self, user_id: i64) -> Result<BalanceSummary, LedgerError> {
        self.db.balance_for_user(user_id).await
    }

    /// Spend `sum` points against `order_number`. The order number does not have to reference an uploaded order.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: OrderNumber,
        sum: Points,
    ) -> Result<Points, LedgerError> {
        if sum.value() <= 0 {
            return Err(LedgerError::InvalidAmount(sum));
        }
        self.db.withdraw(NewWithdrawal::new(user_id, order_number, sum)).await
    }

    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.withdrawals_for_user(user_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
