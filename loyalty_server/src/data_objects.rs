use chrono::{DateTime, Utc};
use lp_common::Points;
use loyalty_engine::db_types::{Order, OrderNumber, OrderStatusType, Withdrawal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalRequest {
    /// The order number the points are spent against.
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    /// Omitted until the reward has actually been calculated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResult {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then_some(order.accrual);
        Self { number: order.number, status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResult {
    pub order: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResult {
    fn from(withdrawal: Withdrawal) -> Self {
        Self { order: withdrawal.order_number, sum: withdrawal.sum, processed_at: withdrawal.processed_at }
    }
}
