use log::debug;
use lp_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::{InsertOrderResult, LedgerError},
};

/// Inserts the order into the database, or reports how the existing row relates to the submitter.
///
/// Order numbers are globally unique, so a resubmission by the owner is an idempotent accept and a submission of
/// somebody else's number is a conflict. The caller decides how to surface each case.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, LedgerError> {
    let NewOrder { number, user_id } = order;
    let result = match fetch_order_by_number(&number, conn).await? {
        Some(existing) if existing.user_id == user_id => InsertOrderResult::AlreadyUploaded(existing),
        Some(existing) => InsertOrderResult::OwnedByAnotherUser(existing.number),
        None => match insert_order(&number, user_id, conn).await {
            Ok(inserted) => {
                debug!("📝️ Order {} inserted with id {}", inserted.number, inserted.id);
                InsertOrderResult::Inserted(inserted)
            },
            // Lost a race against a concurrent submission of the same number. Classify against the winner.
            Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                let existing = fetch_order_by_number(&number, conn)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
                if existing.user_id == user_id {
                    InsertOrderResult::AlreadyUploaded(existing)
                } else {
                    InsertOrderResult::OwnedByAnotherUser(existing.number)
                }
            },
            Err(e) => return Err(e.into()),
        },
    };
    Ok(result)
}

/// Inserts a new order using the given connection. This is not atomic on its own. You can embed this call inside a
/// transaction if you need atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(
    number: &OrderNumber,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders (number, user_id, status, accrual)
            VALUES ($1, $2, 'NEW', 0)
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .bind(user_id)
    .fetch_one(conn)
    .await
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders uploaded by the given user, most recent first.
pub async fn orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Orders still awaiting a reward decision, oldest first. The id tie-break keeps the order deterministic when
/// several orders land within the same clock tick.
pub async fn reconcilable_orders(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status IN ('NEW', 'PROCESSING')
        ORDER BY uploaded_at ASC, id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Writes the new status and accrual for an order, guarded so that terminal rows are never overwritten.
///
/// Returns `None` when the guard filtered the row out: the order is already `INVALID` or `PROCESSED` (or the id
/// is unknown; callers distinguish the two with [`fetch_order_by_id`]).
pub(crate) async fn apply_decision(
    id: i64,
    status: OrderStatusType,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let status = status.to_string();
    let result: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, accrual = $2
        WHERE id = $3 AND status IN ('NEW', 'PROCESSING')
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(accrual.value())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
