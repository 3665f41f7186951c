//! Bridges the [`accrual_client`] HTTP API onto the engine's [`AccrualService`] seam.
//!
//! The remote status vocabulary is wider than the local one: both REGISTERED and PROCESSING mean "no decision
//! yet", so both map to local `PROCESSING`. The mapping also enforces the wire contract: a PROCESSED decision
//! without an accrual amount, or with a negative one, is a protocol violation, not something to write to the
//! ledger.
use accrual_client::{AccrualApi, AccrualApiError, RewardDecision, RewardStatus};
use loyalty_engine::{
    db_types::OrderNumber,
    traits::{AccrualService, AccrualServiceError},
    AccrualDecision,
};

#[derive(Clone)]
pub struct RewardsAdapter {
    api: AccrualApi,
}

impl RewardsAdapter {
    pub fn new(api: AccrualApi) -> Self {
        Self { api }
    }
}

impl AccrualService for RewardsAdapter {
    async fn reward_for_order(&self, number: &OrderNumber) -> Result<Option<AccrualDecision>, AccrualServiceError> {
        let decision = self.api.order_reward(number.as_str()).await.map_err(|e| match e {
            AccrualApiError::JsonError(msg) => AccrualServiceError::Protocol(msg),
            e => AccrualServiceError::Transient(e.to_string()),
        })?;
        decision.map(decision_to_local).transpose()
    }
}

fn decision_to_local(decision: RewardDecision) -> Result<AccrualDecision, AccrualServiceError> {
    let result = match decision.status {
        RewardStatus::Registered | RewardStatus::Processing => AccrualDecision::processing(),
        RewardStatus::Invalid => AccrualDecision::invalid(),
        RewardStatus::Processed => {
            let accrual = decision.accrual.ok_or_else(|| {
                AccrualServiceError::Protocol(format!(
                    "order {} is PROCESSED but the accrual field is missing",
                    decision.order
                ))
            })?;
            if accrual.is_negative() {
                return Err(AccrualServiceError::Protocol(format!(
                    "order {} carries a negative accrual of {accrual}",
                    decision.order
                )));
            }
            AccrualDecision::processed(accrual)
        },
    };
    Ok(result)
}

#[cfg(test)]
mod test {
    use lp_common::Points;
    use loyalty_engine::db_types::OrderStatusType;

    use super::*;

    fn decision(status: RewardStatus, accrual: Option<Points>) -> RewardDecision {
        RewardDecision { order: "12345678903".to_string(), status, accrual }
    }

    #[test]
    fn pending_statuses_map_to_processing() {
        for status in [RewardStatus::Registered, RewardStatus::Processing] {
            let local = decision_to_local(decision(status, None)).unwrap();
            assert_eq!(local.status, OrderStatusType::Processing);
            assert_eq!(local.accrual, Points::default());
        }
    }

    #[test]
    fn invalid_maps_to_invalid() {
        let local = decision_to_local(decision(RewardStatus::Invalid, None)).unwrap();
        assert_eq!(local.status, OrderStatusType::Invalid);
    }

    #[test]
    fn processed_carries_the_accrual() {
        let local = decision_to_local(decision(RewardStatus::Processed, Some(Points::from_points(500)))).unwrap();
        assert_eq!(local, AccrualDecision::processed(Points::from_points(500)));
    }

    #[test]
    fn processed_without_accrual_is_a_protocol_error() {
        let result = decision_to_local(decision(RewardStatus::Processed, None));
        assert!(matches!(result, Err(AccrualServiceError::Protocol(_))));
    }

    #[test]
    fn negative_accruals_are_refused() {
        let result = decision_to_local(decision(RewardStatus::Processed, Some(Points::from_points(-10))));
        assert!(matches!(result, Err(AccrualServiceError::Protocol(_))));
    }
}
