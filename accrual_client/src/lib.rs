//! HTTP client for the external reward-calculation ("accrual") service.
//!
//! The accrual service is an independent system that decides, per order number, whether a reward is due and how
//! large it is. It is rate limited, so the client carries a [`RetryPolicy`] that governs how a single logical query
//! reacts to `429 Too Many Requests` responses. Everything else (5xx, network errors, garbage bodies) is returned
//! to the caller as an error to be retried on a later poll cycle.
mod api;
mod config;
mod error;
mod retry;

mod data_objects;

pub use api::AccrualApi;
pub use config::AccrualConfig;
pub use data_objects::{RewardDecision, RewardStatus};
pub use error::AccrualApiError;
pub use retry::RetryPolicy;
