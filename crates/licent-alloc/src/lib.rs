//! Licent Alloc — the license allocation engine.
//!
//! Three collaborating pieces, all generic over the `licent-core`
//! repository traits so the engine has no storage dependency:
//!
//! - [`ledger::EntitlementLedger`] answers "how many licenses exist and
//!   how many are used" for an (account, product) pair, fresh on every
//!   call.
//! - [`eligibility::EligibilityChecker`] validates one candidate
//!   assignment against the write invariants.
//! - [`service::LicenseService`] orchestrates bulk assignment and mass
//!   unassignment as all-or-nothing operations with pre-flight capacity
//!   validation.

pub mod eligibility;
pub mod ledger;
pub mod service;

pub use eligibility::{EligibilityChecker, EligibilityError};
pub use ledger::{EntitlementLedger, ProductLedger};
pub use service::{
    AllocationOverview, AssignmentDetail, BulkAssignOutcome, BulkUnassignOutcome,
    LicenseService, ProductAllocation,
};
