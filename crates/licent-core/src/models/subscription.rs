//! Subscription domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LicentError, LicentResult};

/// A time-bounded entitlement: `number_of_licenses` seats of one
/// product granted to one account between `issued_at` and `expires_at`.
///
/// Multiple subscriptions may coexist for the same (account, product)
/// pair; their license counts are additive while both are active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub account_id: Uuid,
    pub product_id: Uuid,
    pub number_of_licenses: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the subscription is active at `at`.
    ///
    /// Activity is derived, never stored: a subscription is active iff
    /// its expiry is strictly in the future relative to `at`.
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.expires_at > at
    }
}

/// Fields required to create a new subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub account_id: Uuid,
    pub product_id: Uuid,
    pub number_of_licenses: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CreateSubscription {
    /// Validate the create input before it reaches storage.
    pub fn validate(&self) -> LicentResult<()> {
        if self.number_of_licenses == 0 {
            return Err(LicentError::Validation {
                message: "number_of_licenses must be greater than 0".into(),
            });
        }
        if self.expires_at <= self.issued_at {
            return Err(LicentError::Validation {
                message: "expires_at must be after issued date".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_create() -> CreateSubscription {
        let issued = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        CreateSubscription {
            account_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            number_of_licenses: 5,
            issued_at: issued,
            expires_at: issued + Duration::days(365),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(base_create().validate().is_ok());
    }

    #[test]
    fn zero_licenses_rejected() {
        let mut input = base_create();
        input.number_of_licenses = 0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn expiry_must_be_after_issue() {
        let mut input = base_create();
        input.expires_at = input.issued_at;
        assert!(input.validate().is_err());

        input.expires_at = input.issued_at - Duration::days(1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn activity_is_relative_to_evaluation_time() {
        let input = base_create();
        let sub = Subscription {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            product_id: input.product_id,
            number_of_licenses: input.number_of_licenses,
            issued_at: input.issued_at,
            expires_at: input.expires_at,
            created_at: input.issued_at,
        };

        assert!(sub.is_active(sub.expires_at - Duration::seconds(1)));
        // Strict comparison: not active at the expiry instant itself.
        assert!(!sub.is_active(sub.expires_at));
        assert!(!sub.is_active(sub.expires_at + Duration::seconds(1)));
    }
}
