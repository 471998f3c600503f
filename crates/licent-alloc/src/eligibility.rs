//! Eligibility Checker — per-candidate validation of the write
//! invariants, in order, short-circuiting on the first failure.

use chrono::{DateTime, Utc};
use licent_core::error::{LicentError, LicentResult};
use licent_core::repository::{AssignmentRepository, SubscriptionRepository, UserRepository};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::EntitlementLedger;

/// Why a candidate assignment was rejected. The `Display` text is the
/// user-visible message, shown verbatim by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    #[error("User must belong to the specified account")]
    UserNotInAccount,

    #[error("User already has a license for this product")]
    AlreadyLicensed,

    #[error("No active subscription found for this product")]
    NoActiveSubscription,

    #[error("No available licenses for this product")]
    NoAvailableLicenses,
}

impl From<EligibilityError> for LicentError {
    fn from(err: EligibilityError) -> Self {
        LicentError::Validation {
            message: err.to_string(),
        }
    }
}

/// Validates a single (account, user, product) candidate assignment.
///
/// Check order: account membership, uniqueness, active subscription,
/// remaining capacity. This is the pre-flight form of the invariants;
/// the assignment store re-validates them inside the write transaction.
pub struct EligibilityChecker<'a, U, S, A> {
    users: &'a U,
    subscriptions: &'a S,
    assignments: &'a A,
}

impl<'a, U, S, A> EligibilityChecker<'a, U, S, A>
where
    U: UserRepository,
    S: SubscriptionRepository,
    A: AssignmentRepository,
{
    pub fn new(users: &'a U, subscriptions: &'a S, assignments: &'a A) -> Self {
        Self {
            users,
            subscriptions,
            assignments,
        }
    }

    /// Accept or reject one candidate, with activity evaluated at `at`.
    pub async fn check(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> LicentResult<()> {
        // a. The user must exist inside the account boundary. A user
        //    from another account resolves to nothing here.
        match self.users.get_by_id(account_id, user_id).await {
            Ok(_) => {}
            Err(LicentError::NotFound { .. }) => {
                return Err(EligibilityError::UserNotInAccount.into());
            }
            Err(e) => return Err(e),
        }

        // b. One license per user per product per account.
        let holders = self
            .assignments
            .assigned_user_ids(account_id, product_id)
            .await?;
        if holders.contains(&user_id) {
            return Err(EligibilityError::AlreadyLicensed.into());
        }

        // c/d. An active subscription must exist and leave capacity.
        let ledger = EntitlementLedger::new(self.subscriptions, self.assignments)
            .for_product(account_id, product_id, at)
            .await?;
        if ledger.total_licenses == 0 {
            return Err(EligibilityError::NoActiveSubscription.into());
        }
        if ledger.remaining() <= 0 {
            return Err(EligibilityError::NoAvailableLicenses.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_are_the_user_facing_text() {
        assert_eq!(
            EligibilityError::UserNotInAccount.to_string(),
            "User must belong to the specified account"
        );
        assert_eq!(
            EligibilityError::AlreadyLicensed.to_string(),
            "User already has a license for this product"
        );
        assert_eq!(
            EligibilityError::NoActiveSubscription.to_string(),
            "No active subscription found for this product"
        );
        assert_eq!(
            EligibilityError::NoAvailableLicenses.to_string(),
            "No available licenses for this product"
        );
    }

    #[test]
    fn converts_into_validation_error() {
        let err: LicentError = EligibilityError::NoActiveSubscription.into();
        match err {
            LicentError::Validation { message } => {
                assert_eq!(message, "No active subscription found for this product");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
