use lp_common::Points;

use crate::db_types::{Order, OrderNumber, OrderStatusType};

/// The outcome of an idempotent order submission.
#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    /// The order was not seen before and has been stored with status `NEW`.
    Inserted(Order),
    /// The same user already uploaded this number. Not an error; the submission is accepted idempotently.
    AlreadyUploaded(Order),
    /// A different user owns this number. The submission must be rejected.
    OwnedByAnotherUser(OrderNumber),
}

/// A reward decision translated into local terms, ready to be committed against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualDecision {
    pub status: OrderStatusType,
    /// Zero unless `status` is `Processed`.
    pub accrual: Points,
}

impl AccrualDecision {
    /// The remote calculation is still pending (remote REGISTERED or PROCESSING).
    pub fn processing() -> Self {
        Self { status: OrderStatusType::Processing, accrual: Points::default() }
    }

    /// The remote system declined the order.
    pub fn invalid() -> Self {
        Self { status: OrderStatusType::Invalid, accrual: Points::default() }
    }

    /// The reward has been calculated.
    pub fn processed(accrual: Points) -> Self {
        Self { status: OrderStatusType::Processed, accrual }
    }
}

/// The outcome of committing a decision against an order.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The status (and, for `Processed`, the balance credit) was written.
    Applied(Order),
    /// The order was already in a terminal state. Nothing was written; crediting twice is impossible.
    AlreadyFinal(Order),
}

impl CommitOutcome {
    pub fn order(&self) -> &Order {
        match self {
            CommitOutcome::Applied(order) => order,
            CommitOutcome::AlreadyFinal(order) => order,
        }
    }
}
