use thiserror::Error;

use crate::{db_types::OrderNumber, traits::AccrualDecision};

/// The seam to the external reward calculator.
///
/// The contract deliberately has only three outcomes: a decision, "not registered yet" (`Ok(None)`), or an error.
/// Every error is a deferral (the caller leaves the order untouched and retries it on a later poll cycle), so
/// implementations should fold rate-limit exhaustion, 5xx responses, network failures and malformed bodies into
/// [`AccrualServiceError`] rather than panicking or retrying forever.
#[allow(async_fn_in_trait)]
pub trait AccrualService {
    async fn reward_for_order(&self, number: &OrderNumber) -> Result<Option<AccrualDecision>, AccrualServiceError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccrualServiceError {
    #[error("Transient accrual service failure: {0}")]
    Transient(String),
    #[error("The accrual service broke protocol: {0}")]
    Protocol(String),
}
