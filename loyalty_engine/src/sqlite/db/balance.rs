use log::trace;
use lp_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LedgerError,
};

/// Adds `delta` to the user's balance (creating the row if this is the user's first credit) and returns the
/// resulting sum.
///
/// The non-negative invariant is enforced here, after the write: if the new sum is negative the function fails
/// with [`LedgerError::InsufficientFunds`] and the caller MUST abort its transaction, which unwinds this update
/// together with whatever else the transaction touched. Never call this on a bare pool connection when `delta`
/// can be negative.
pub async fn apply_delta(user_id: i64, delta: Points, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let sum: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO balances (user_id, current) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET
            current = current + excluded.current,
            updated_at = CURRENT_TIMESTAMP
        RETURNING current
        "#,
    )
    .bind(user_id)
    .bind(delta.value())
    .fetch_one(conn)
    .await?;
    let new_balance = Points::from(sum);
    if new_balance.is_negative() {
        trace!("💰️ Delta {delta} would leave user #{user_id} at {new_balance}. Refusing.");
        return Err(LedgerError::InsufficientFunds);
    }
    Ok(new_balance)
}

pub async fn insert_withdrawal(
    withdrawal: &NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, LedgerError> {
    let record = sqlx::query_as(
        r#"
        INSERT INTO withdrawals (user_id, order_number, sum)
        VALUES ($1, $2, $3)
        RETURNING *;
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.sum.value())
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn current_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let sum: Option<i64> = sqlx::query_scalar("SELECT current FROM balances WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(Points::from(sum.unwrap_or_default()))
}

pub async fn withdrawn_total(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(sum), 0) FROM withdrawals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(Points::from(sum))
}

/// The user's withdrawal history, most recent first.
pub async fn withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
