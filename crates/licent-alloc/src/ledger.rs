//! Entitlement Ledger — read-only license accounting.

use chrono::{DateTime, Utc};
use licent_core::error::LicentResult;
use licent_core::repository::{AssignmentRepository, SubscriptionRepository};
use uuid::Uuid;

/// License totals for one (account, product) pair at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLedger {
    /// Sum of `number_of_licenses` over currently-active subscriptions.
    pub total_licenses: i64,
    /// Count of assignment rows, regardless of subscription state:
    /// expiry freezes entitlement going forward but does not revoke
    /// existing grants.
    pub used_licenses: i64,
}

impl ProductLedger {
    /// Remaining capacity. May be negative when a subscription was
    /// reduced or expired after over-allocation; never auto-corrected.
    pub fn remaining(&self) -> i64 {
        self.total_licenses - self.used_licenses
    }
}

/// Read model over subscriptions and assignments.
///
/// Every call recomputes from the stores: subscription activity is a
/// function of wall-clock time, so there is nothing safe to cache.
pub struct EntitlementLedger<'a, S, A> {
    subscriptions: &'a S,
    assignments: &'a A,
}

impl<'a, S, A> EntitlementLedger<'a, S, A>
where
    S: SubscriptionRepository,
    A: AssignmentRepository,
{
    pub fn new(subscriptions: &'a S, assignments: &'a A) -> Self {
        Self {
            subscriptions,
            assignments,
        }
    }

    /// Totals for one (account, product) pair with activity evaluated
    /// at `at`. No side effects.
    pub async fn for_product(
        &self,
        account_id: Uuid,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> LicentResult<ProductLedger> {
        let total_licenses = self
            .subscriptions
            .total_licenses_for(account_id, product_id, at)
            .await?;
        let used_licenses = self
            .assignments
            .count_for_product(account_id, product_id)
            .await?;

        Ok(ProductLedger {
            total_licenses,
            used_licenses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_total_minus_used() {
        let ledger = ProductLedger {
            total_licenses: 10,
            used_licenses: 3,
        };
        assert_eq!(ledger.remaining(), 7);
    }

    #[test]
    fn remaining_may_go_negative() {
        // A subscription shrank (or expired) after over-allocation.
        let ledger = ProductLedger {
            total_licenses: 2,
            used_licenses: 5,
        };
        assert_eq!(ledger.remaining(), -3);
    }
}
