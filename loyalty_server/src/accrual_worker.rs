//! The order-accrual reconciliation pipeline.
//!
//! Three cooperating stages, wired by channels:
//! * a **producer** that polls the store on a fixed interval for orders still awaiting a reward decision
//!   (status `NEW` or `PROCESSING`, oldest first, bounded batch),
//! * a **worker** that queries the accrual service per order and commits the resulting state transition (and,
//!   for `PROCESSED`, the balance credit) in one atomic transaction,
//! * an **error sink** that logs failures with order context and keeps the loop alive.
//!
//! Nothing here ever stops the pipeline because of one order: "not registered yet" and transient remote failures
//! leave the order untouched, and it simply comes around again on a later poll. The terminal-status guard inside
//! [`LedgerDatabase::commit_decision`] makes re-processing an already-finalised order a no-op, so the pipeline can
//! afford to re-fetch an order that is still sitting in the channel from a previous cycle.
//!
//! All waits (the poll tick, channel sends, and the in-flight remote call) are raced against a shared shutdown
//! signal so the pipeline exits promptly without finishing a retry chain.
use log::*;
use loyalty_engine::{
    db_types::{Order, OrderNumber},
    traits::{AccrualService, AccrualServiceError, LedgerError},
    CommitOutcome,
    LedgerDatabase,
    SqliteDatabase,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{config::ReconciliationConfig, integrations::accrual::RewardsAdapter};

const ERROR_BUFFER_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not fetch orders for reconciliation. {0}")]
    Fetch(LedgerError),
    #[error("Querying the accrual service for order {number} failed. {source}")]
    Accrual { number: OrderNumber, source: AccrualServiceError },
    #[error("Could not commit the decision for order {number}. {source}")]
    Commit { number: OrderNumber, source: LedgerError },
}

/// Starts the reconciliation worker. Do not await the returned JoinHandle until the shutdown signal has been
/// raised, as it will run for the lifetime of the process.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    accrual: RewardsAdapter,
    config: ReconciliationConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "♻️ Accrual reconciliation worker started (poll every {:?}, batches of {})",
            config.poll_interval, config.batch_size
        );
        run_pipeline(&db, &accrual, config, shutdown).await;
        info!("♻️ Accrual reconciliation worker stopped");
    })
}

/// Runs the producer, worker and error-sink stages to completion. Generic so that tests can drive it against
/// mocks; production code enters through [`start_accrual_worker`].
pub async fn run_pipeline<B, A>(db: &B, accrual: &A, config: ReconciliationConfig, shutdown: watch::Receiver<bool>)
where
    B: LedgerDatabase,
    A: AccrualService,
{
    let (order_tx, mut order_rx) = mpsc::channel::<Order>(config.batch_size.max(1) as usize);
    let (err_tx, mut err_rx) = mpsc::channel::<PipelineError>(ERROR_BUFFER_SIZE);

    let producer = {
        let mut shutdown = shutdown.clone();
        let err_tx = err_tx.clone();
        async move {
            let mut timer = tokio::time::interval(config.poll_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = timer.tick() => {},
                }
                match db.fetch_reconcilable_orders(config.batch_size).await {
                    Ok(orders) => {
                        for order in orders {
                            tokio::select! {
                                _ = shutdown.changed() => return,
                                result = order_tx.send(order) => {
                                    if result.is_err() {
                                        return;
                                    }
                                },
                            }
                        }
                    },
                    Err(e) => {
                        let _ = err_tx.send(PipelineError::Fetch(e)).await;
                    },
                }
            }
        }
    };

    let worker = {
        let mut shutdown = shutdown.clone();
        let err_tx = err_tx.clone();
        async move {
            loop {
                let order = tokio::select! {
                    _ = shutdown.changed() => break,
                    order = order_rx.recv() => match order {
                        Some(order) => order,
                        None => break,
                    },
                };
                tokio::select! {
                    // Dropping the in-flight future here abandons the current remote call, backoff waits included.
                    _ = shutdown.changed() => break,
                    _ = reconcile_order(db, accrual, &order, &err_tx) => {},
                }
            }
        }
    };

    let sink = async move {
        while let Some(e) = err_rx.recv().await {
            error!("♻️ {e}");
        }
    };

    // The sink ends once the producer's and worker's error senders are gone; this handle must go first.
    drop(err_tx);
    futures::join!(producer, worker, sink);
}

async fn reconcile_order<B, A>(db: &B, accrual: &A, order: &Order, errors: &mpsc::Sender<PipelineError>)
where
    B: LedgerDatabase,
    A: AccrualService,
{
    match accrual.reward_for_order(&order.number).await {
        Ok(Some(decision)) => match db.commit_decision(order.id, order.user_id, &decision).await {
            Ok(CommitOutcome::Applied(updated)) => {
                debug!("♻️ Order {} is now {}", updated.number, updated.status);
            },
            Ok(CommitOutcome::AlreadyFinal(updated)) => {
                trace!("♻️ Order {} had already been finalised as {}", updated.number, updated.status);
            },
            Err(e) => {
                let _ = errors.send(PipelineError::Commit { number: order.number.clone(), source: e }).await;
            },
        },
        Ok(None) => {
            trace!(
                "♻️ Order {} is not registered with the accrual service yet. It stays eligible for the next cycle",
                order.number
            );
        },
        Err(e) => {
            let _ = errors.send(PipelineError::Accrual { number: order.number.clone(), source: e }).await;
        },
    }
}
