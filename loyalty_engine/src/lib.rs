//! Loyalty Points Engine
//!
//! The loyalty engine is the storage and bookkeeping core of the loyalty points server. This library contains the
//! order ledger, the per-user point balances and withdrawal history, and the contracts that the reconciliation
//! pipeline and the HTTP layer are built against. It is provider-agnostic:
//!
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]): order submission, balances, withdrawals ([`LedgerApi`]) and user
//!    registration/login ([`AuthApi`]). Specific backends need to implement the traits in [`mod@traits`] in order
//!    to act as a backend for the loyalty server.
//!
//! The traits also define the [`traits::AccrualService`] seam: the engine consumes reward decisions from an
//! external calculator but never implements the calculation itself.
mod api;

pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{auth_api::AuthApi, ledger_api::LedgerApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AccrualDecision, AccrualService, CommitOutcome, InsertOrderResult, LedgerDatabase, UserManagement};
