//! Integration tests for the order ledger and balance invariants, run against a real SQLite store.
use loyalty_engine::{
    db_types::{NewUser, OrderNumber, OrderStatusType},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccrualDecision,
    AuthApi,
    CommitOutcome,
    InsertOrderResult,
    LedgerApi,
    LedgerDatabase,
    SqliteDatabase,
    UserManagement,
};
use lp_common::Points;
use loyalty_engine::traits::{AuthApiError, LedgerError};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn new_user(db: &SqliteDatabase, login: &str) -> i64 {
    let user = NewUser { login: login.to_string(), password_hash: "irrelevant".to_string() };
    db.create_user(user).await.expect("Error creating user").id
}

fn number(s: &str) -> OrderNumber {
    OrderNumber::from(s.to_string())
}

#[tokio::test]
async fn empty_balance_rejects_withdrawals() {
    let db = new_db().await;
    let user = new_user(&db, "alice").await;
    let api = LedgerApi::new(db.clone());

    let result = api.withdraw(user, number("2377225624"), Points::from_points(1)).await;
    assert!(matches!(result, Err(LedgerError::InsufficientFunds)));

    // Nothing may have leaked through: no balance change, no withdrawal record.
    let summary = api.balance_for_user(user).await.unwrap();
    assert_eq!(summary.current, Points::default());
    assert_eq!(summary.withdrawn, Points::default());
    assert!(api.withdrawals_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn withdrawal_round_trip() {
    let db = new_db().await;
    let user = new_user(&db, "bob").await;
    let api = LedgerApi::new(db.clone());

    let order = match api.submit_order(number("12345678903"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    db.commit_decision(order.id, user, &AccrualDecision::processed(Points::from_points(500))).await.unwrap();

    let new_balance = api.withdraw(user, number("2377225624"), Points::from_points(300)).await.unwrap();
    assert_eq!(new_balance, Points::from_points(200));

    let summary = api.balance_for_user(user).await.unwrap();
    assert_eq!(summary.current, Points::from_points(200));
    assert_eq!(summary.withdrawn, Points::from_points(300));
    let history = api.withdrawals_for_user(user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sum, Points::from_points(300));
    assert_eq!(history[0].order_number, number("2377225624"));

    // A second withdrawal over the remaining balance must change nothing.
    let result = api.withdraw(user, number("2377225624"), Points::from_points(300)).await;
    assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
    let summary = api.balance_for_user(user).await.unwrap();
    assert_eq!(summary.current, Points::from_points(200));
    assert_eq!(api.withdrawals_for_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_positive_withdrawals_are_rejected() {
    let db = new_db().await;
    let user = new_user(&db, "carol").await;
    let api = LedgerApi::new(db);

    for sum in [Points::default(), Points::from_points(-5)] {
        let result = api.withdraw(user, number("2377225624"), sum).await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }
}

#[tokio::test]
async fn order_walks_through_processing_to_processed() {
    let db = new_db().await;
    let user = new_user(&db, "dave").await;
    let api = LedgerApi::new(db.clone());

    let order = match api.submit_order(number("12345678903"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    assert_eq!(order.status, OrderStatusType::New);

    let outcome = db.commit_decision(order.id, user, &AccrualDecision::processing()).await.unwrap();
    let order = match outcome {
        CommitOutcome::Applied(order) => order,
        other => panic!("expected the decision to apply, got {other:?}"),
    };
    assert_eq!(order.status, OrderStatusType::Processing);
    // Still awaiting a final decision, so still eligible for polling.
    let pending = db.fetch_reconcilable_orders(10).await.unwrap();
    assert_eq!(pending.len(), 1);

    let outcome =
        db.commit_decision(order.id, user, &AccrualDecision::processed(Points::from_points(500))).await.unwrap();
    let order = outcome.order().clone();
    assert_eq!(order.status, OrderStatusType::Processed);
    assert_eq!(order.accrual, Points::from_points(500));
    assert_eq!(api.balance_for_user(user).await.unwrap().current, Points::from_points(500));
    // Terminal now: the pipeline must never see this order again.
    assert!(db.fetch_reconcilable_orders(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_shot_processed_from_new() {
    let db = new_db().await;
    let user = new_user(&db, "erin").await;

    let order = match db.insert_order(loyalty_engine::db_types::NewOrder::new(number("79927398713"), user)).await {
        Ok(InsertOrderResult::Inserted(order)) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    let outcome = db
        .commit_decision(order.id, user, &AccrualDecision::processed(Points::try_from(729.98).unwrap()))
        .await
        .unwrap();
    assert!(matches!(outcome, CommitOutcome::Applied(_)));
    let summary = db.balance_for_user(user).await.unwrap();
    assert_eq!(summary.current, Points::from(72998));
}

#[tokio::test]
async fn invalid_orders_never_credit() {
    let db = new_db().await;
    let user = new_user(&db, "frank").await;
    let api = LedgerApi::new(db.clone());

    let order = match api.submit_order(number("12345678903"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    let outcome = db.commit_decision(order.id, user, &AccrualDecision::invalid()).await.unwrap();
    assert_eq!(outcome.order().status, OrderStatusType::Invalid);
    assert_eq!(api.balance_for_user(user).await.unwrap().current, Points::default());
    // Terminal: excluded from future polling.
    assert!(db.fetch_reconcilable_orders(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn crediting_twice_is_a_noop() {
    let db = new_db().await;
    let user = new_user(&db, "grace").await;

    let order = match db.insert_order(loyalty_engine::db_types::NewOrder::new(number("12345678903"), user)).await {
        Ok(InsertOrderResult::Inserted(order)) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    let decision = AccrualDecision::processed(Points::from_points(500));

    // Two workers race to commit the same decision.
    let (a, b) = tokio::join!(db.commit_decision(order.id, user, &decision), db.commit_decision(order.id, user, &decision));
    let applied = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|outcome| matches!(outcome, CommitOutcome::Applied(_)))
        .count();
    assert_eq!(applied, 1, "exactly one of the two commits may apply");

    // And a later retry is still a no-op.
    let outcome = db.commit_decision(order.id, user, &decision).await.unwrap();
    assert!(matches!(outcome, CommitOutcome::AlreadyFinal(_)));

    let summary = db.balance_for_user(user).await.unwrap();
    assert_eq!(summary.current, Points::from_points(500), "the order must be credited exactly once");
}

#[tokio::test]
async fn reconcilable_orders_are_oldest_first_and_bounded() {
    let db = new_db().await;
    let user = new_user(&db, "heidi").await;
    let api = LedgerApi::new(db.clone());

    let first = match api.submit_order(number("12345678903"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    let second = match api.submit_order(number("79927398713"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };
    let third = match api.submit_order(number("49927398716"), user).await.unwrap() {
        InsertOrderResult::Inserted(order) => order,
        other => panic!("expected a fresh insert, got {other:?}"),
    };

    db.commit_decision(second.id, user, &AccrualDecision::invalid()).await.unwrap();

    let pending = db.fetch_reconcilable_orders(10).await.unwrap();
    let ids: Vec<i64> = pending.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![first.id, third.id]);

    let pending = db.fetch_reconcilable_orders(1).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);
}

#[tokio::test]
async fn duplicate_submissions() {
    let db = new_db().await;
    let alice = new_user(&db, "ivan").await;
    let mallory = new_user(&db, "judy").await;
    let api = LedgerApi::new(db);

    assert!(matches!(
        api.submit_order(number("12345678903"), alice).await.unwrap(),
        InsertOrderResult::Inserted(_)
    ));
    assert!(matches!(
        api.submit_order(number("12345678903"), alice).await.unwrap(),
        InsertOrderResult::AlreadyUploaded(_)
    ));
    assert!(matches!(
        api.submit_order(number("12345678903"), mallory).await.unwrap(),
        InsertOrderResult::OwnedByAnotherUser(_)
    ));
}

#[tokio::test]
async fn registration_and_login() {
    let db = new_db().await;
    let auth = AuthApi::new(db);

    let user = auth.register("kim", "hunter2").await.unwrap();
    assert_eq!(user.login, "kim");

    let result = auth.register("kim", "again").await;
    assert!(matches!(result, Err(AuthApiError::LoginUnavailable(_))));

    let user = auth.authenticate("kim", "hunter2").await.unwrap();
    assert_eq!(user.login, "kim");
    assert!(matches!(auth.authenticate("kim", "wrong").await, Err(AuthApiError::InvalidCredentials)));
    assert!(matches!(auth.authenticate("nobody", "hunter2").await, Err(AuthApiError::InvalidCredentials)));
}
