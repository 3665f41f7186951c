use std::fmt::Display;

use lp_common::Points;
use serde::{Deserialize, Serialize};

/// The status of an order as reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RewardStatus {
    /// The order is known to the accrual service but the calculation has not started.
    Registered,
    /// The reward is being calculated.
    Processing,
    /// The accrual service declined to calculate a reward for this order.
    Invalid,
    /// The calculation is complete and `accrual` carries the result.
    Processed,
}

impl Display for RewardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardStatus::Registered => write!(f, "REGISTERED"),
            RewardStatus::Processing => write!(f, "PROCESSING"),
            RewardStatus::Invalid => write!(f, "INVALID"),
            RewardStatus::Processed => write!(f, "PROCESSED"),
        }
    }
}

/// A successful (HTTP 200) response from `GET /api/orders/{number}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDecision {
    /// The order number the decision applies to.
    pub order: String,
    pub status: RewardStatus,
    /// Only present when `status` is `PROCESSED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_processed_decision() {
        let json = r#"{"order": "12345678903", "status": "PROCESSED", "accrual": 500}"#;
        let decision: RewardDecision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.order, "12345678903");
        assert_eq!(decision.status, RewardStatus::Processed);
        assert_eq!(decision.accrual, Some(Points::from_points(500)));
    }

    #[test]
    fn deserialize_pending_decision_without_accrual() {
        let json = r#"{"order": "9278923470", "status": "REGISTERED"}"#;
        let decision: RewardDecision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.status, RewardStatus::Registered);
        assert!(decision.accrual.is_none());
    }

    #[test]
    fn deserialize_fractional_accrual() {
        let json = r#"{"order": "346436439", "status": "PROCESSED", "accrual": 729.98}"#;
        let decision: RewardDecision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.accrual, Some(Points::from(72998)));
    }
}
