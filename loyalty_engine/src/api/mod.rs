//! The public-facing API of the loyalty engine.
//!
//! Thin, backend-agnostic wrappers over the [`crate::traits`] contracts. The HTTP layer and the reconciliation
//! worker talk to these instead of reaching into the database modules directly.
pub mod auth_api;
pub mod ledger_api;
