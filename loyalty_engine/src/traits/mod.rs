//! The behaviour contracts for loyalty engine backends.
//!
//! [`LedgerDatabase`] is the storage seam: everything the order/balance ledger needs from a database, expressed so
//! that the transactional promises (one commit or one rollback, never a split) are part of the contract rather
//! than an implementation detail. [`UserManagement`] covers account registration and lookup. [`AccrualService`] is
//! the seam to the remote reward calculator, kept abstract here so the reconciliation pipeline can be driven
//! against a mock.
mod accrual_service;
mod data_objects;
mod ledger_database;
mod user_management;

pub use accrual_service::{AccrualService, AccrualServiceError};
pub use data_objects::{AccrualDecision, CommitOutcome, InsertOrderResult};
pub use ledger_database::{LedgerDatabase, LedgerError};
pub use user_management::{AuthApiError, UserManagement};
