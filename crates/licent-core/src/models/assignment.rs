//! License assignment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The grant of one product license to one user within one account.
///
/// The triple (user_id, product_id, account_id) is unique across all
/// assignments. An assignment has no intermediate state: it is either
/// present or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseAssignment {
    pub id: Uuid,
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Fields required to create a new license assignment.
///
/// Creation is validated at write time: the user must belong to the
/// account, an active subscription must exist for the product, and
/// remaining capacity must cover the new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicenseAssignment {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
}
