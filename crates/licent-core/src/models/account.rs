//! Account domain model.
//!
//! Accounts are the tenant boundary: every user, subscription, and
//! license assignment belongs to exactly one account, and no operation
//! may cross it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant organization.
///
/// Deleting an account cascades to its users, subscriptions, and
/// license assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
}

/// Fields that can be updated on an existing account.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAccount {
    pub name: Option<String>,
}
