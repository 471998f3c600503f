//! Bulk Allocator — transactional orchestration of multi-user,
//! multi-product license assignment and mass unassignment.
//!
//! Every public operation returns a structured outcome instead of
//! erroring past the engine boundary: callers display `message`
//! verbatim, and a failed operation never partially applies.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use licent_core::clock::Clock;
use licent_core::error::LicentResult;
use licent_core::models::assignment::{CreateLicenseAssignment, LicenseAssignment};
use licent_core::models::product::Product;
use licent_core::repository::{
    AssignmentRepository, ProductRepository, SubscriptionRepository, UserRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::eligibility::EligibilityChecker;
use crate::ledger::EntitlementLedger;

/// Result of a bulk assignment request.
#[derive(Debug, Clone)]
pub struct BulkAssignOutcome {
    pub success: bool,
    pub message: String,
    /// The assignments created by this request (empty on failure, and
    /// on the everything-already-assigned success case).
    pub assignments: Vec<LicenseAssignment>,
}

impl BulkAssignOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            assignments: Vec::new(),
        }
    }
}

/// Result of a bulk unassignment request.
#[derive(Debug, Clone)]
pub struct BulkUnassignOutcome {
    pub success: bool,
    pub message: String,
    /// Rows actually removed; ids outside the account never count.
    pub removed: u64,
}

impl BulkUnassignOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            removed: 0,
        }
    }
}

/// One product's allocation state in the overview read model.
#[derive(Debug, Clone)]
pub struct ProductAllocation {
    pub product: Product,
    pub total_licenses: i64,
    pub used_licenses: i64,
    pub remaining_licenses: i64,
}

/// One current assignment joined with its user and product, for
/// rendering allocation state.
#[derive(Debug, Clone)]
pub struct AssignmentDetail {
    pub assignment: LicenseAssignment,
    pub user_name: String,
    pub user_email: String,
    pub product_name: String,
}

/// Allocation state for one account: per-product license totals plus
/// the current assignments. Read-only.
#[derive(Debug, Clone)]
pub struct AllocationOverview {
    pub products: Vec<ProductAllocation>,
    pub assignments: Vec<AssignmentDetail>,
}

/// Normalize a raw id selection: blanks discarded, entries
/// deduplicated preserving first-seen order, then parsed. Returns the
/// parsed ids and the number of distinct non-blank entries requested —
/// an unparsable entry still counts as requested, so it later trips
/// the invalid-selection check exactly like an unknown id.
fn normalize_ids(raw: &[String]) -> (Vec<Uuid>, usize) {
    let mut seen: Vec<&str> = Vec::new();
    let mut ids = Vec::new();

    for entry in raw {
        let trimmed = entry.trim();
        if trimmed.is_empty() || seen.contains(&trimmed) {
            continue;
        }
        seen.push(trimmed);
        if let Ok(id) = Uuid::parse_str(trimmed) {
            ids.push(id);
        }
    }

    (ids, seen.len())
}

/// The license allocation engine.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate, and over the clock so
/// subscription activity is deterministic under test.
pub struct LicenseService<P, U, S, A, C> {
    products: P,
    users: U,
    subscriptions: S,
    assignments: A,
    clock: C,
}

impl<P, U, S, A, C> LicenseService<P, U, S, A, C>
where
    P: ProductRepository,
    U: UserRepository,
    S: SubscriptionRepository,
    A: AssignmentRepository,
    C: Clock,
{
    pub fn new(products: P, users: U, subscriptions: S, assignments: A, clock: C) -> Self {
        Self {
            products,
            users,
            subscriptions,
            assignments,
            clock,
        }
    }

    /// Assign every selected product to every selected user,
    /// all-or-nothing.
    ///
    /// Candidates are the Cartesian product of products × users in
    /// product-then-user order; pairs where the user already holds the
    /// product are skipped. A pre-flight capacity check rejects the
    /// whole request if any product cannot cover its net-new demand,
    /// and the store re-validates capacity inside the write
    /// transaction, so a lost race rolls back instead of
    /// over-allocating.
    pub async fn bulk_assign(
        &self,
        account_id: Uuid,
        product_ids: &[String],
        user_ids: &[String],
    ) -> BulkAssignOutcome {
        match self.try_bulk_assign(account_id, product_ids, user_ids).await {
            Ok(outcome) => outcome,
            Err(e) => BulkAssignOutcome::failure(format!("An unexpected error occurred: {e}")),
        }
    }

    async fn try_bulk_assign(
        &self,
        account_id: Uuid,
        product_ids: &[String],
        user_ids: &[String],
    ) -> LicentResult<BulkAssignOutcome> {
        let (product_ids, products_requested) = normalize_ids(product_ids);
        let (user_ids, users_requested) = normalize_ids(user_ids);

        if products_requested == 0 {
            return Ok(BulkAssignOutcome::failure(
                "Please select at least one product",
            ));
        }
        if users_requested == 0 {
            return Ok(BulkAssignOutcome::failure("Please select at least one user"));
        }

        // Resolve ids inside the account boundary; anything that fails
        // to resolve there invalidates the whole selection.
        let products = self
            .products
            .get_for_account(account_id, &product_ids)
            .await?;
        if products.len() != products_requested {
            return Ok(BulkAssignOutcome::failure("Invalid products selected"));
        }

        let users = self.users.get_for_account(account_id, &user_ids).await?;
        if users.len() != users_requested {
            return Ok(BulkAssignOutcome::failure("Invalid users selected"));
        }

        let now = self.clock.now();

        // Pre-flight: per product, net-new demand against remaining
        // capacity, as one snapshot. Fails the batch as a whole so it
        // cannot partially succeed up to the limit.
        let holders = self.current_holders(account_id, &products).await?;
        if let Some(message) = self
            .capacity_violations(account_id, &products, &users, &holders, now)
            .await?
        {
            return Ok(BulkAssignOutcome::failure(message));
        }

        // Candidates in product-then-user order, skipping pairs the
        // user already holds.
        let mut rows = Vec::new();
        for product in &products {
            let held = &holders[&product.id];
            for user in &users {
                if held.contains(&user.id) {
                    debug!(
                        user_id = %user.id,
                        product_id = %product.id,
                        "Skipping existing assignment"
                    );
                    continue;
                }
                rows.push(CreateLicenseAssignment {
                    account_id,
                    user_id: user.id,
                    product_id: product.id,
                });
            }
        }

        if rows.is_empty() {
            return Ok(BulkAssignOutcome {
                success: true,
                message: "No licenses were assigned - all selected users already have \
                          the selected products"
                    .into(),
                assignments: Vec::new(),
            });
        }

        let created = self.assignments.create_batch(account_id, &rows, now).await?;

        info!(
            account_id = %account_id,
            created = created.len(),
            "Bulk assignment committed"
        );

        Ok(BulkAssignOutcome {
            success: true,
            message: format!("Successfully assigned {} license(s)", created.len()),
            assignments: created,
        })
    }

    /// Remove the listed assignments. Ids outside the account are
    /// silently ignored; the reported count covers only rows actually
    /// removed.
    pub async fn bulk_unassign(
        &self,
        account_id: Uuid,
        assignment_ids: &[String],
    ) -> BulkUnassignOutcome {
        let (ids, requested) = normalize_ids(assignment_ids);

        if requested == 0 {
            return BulkUnassignOutcome::failure("Please select at least one assignment");
        }

        match self.assignments.delete_batch(account_id, &ids).await {
            Ok(removed) => {
                info!(account_id = %account_id, removed, "Bulk unassignment committed");
                BulkUnassignOutcome {
                    success: true,
                    message: format!("Successfully removed {removed} license(s)"),
                    removed,
                }
            }
            Err(e) => BulkUnassignOutcome::failure(format!("Failed to remove licenses: {e}")),
        }
    }

    /// Create a single assignment, validated per-candidate first and
    /// re-validated inside the store's write transaction.
    pub async fn assign_one(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
    ) -> LicentResult<LicenseAssignment> {
        let now = self.clock.now();

        EligibilityChecker::new(&self.users, &self.subscriptions, &self.assignments)
            .check(account_id, user_id, product_id, now)
            .await?;

        let rows = [CreateLicenseAssignment {
            account_id,
            user_id,
            product_id,
        }];
        let mut created = self.assignments.create_batch(account_id, &rows, now).await?;

        created
            .pop()
            .ok_or_else(|| licent_core::error::LicentError::Internal(
                "assignment batch committed without returning a row".into(),
            ))
    }

    /// Allocation state for the account: per-product totals for every
    /// product with an active subscription, plus current assignments
    /// joined with user and product, ordered by product then user name.
    pub async fn allocation_overview(&self, account_id: Uuid) -> LicentResult<AllocationOverview> {
        let now = self.clock.now();
        let ledger = EntitlementLedger::new(&self.subscriptions, &self.assignments);

        let mut product_allocations = Vec::new();
        for product in self.products.list_subscribed(account_id, now).await? {
            let totals = ledger.for_product(account_id, product.id, now).await?;
            product_allocations.push(ProductAllocation {
                product,
                total_licenses: totals.total_licenses,
                used_licenses: totals.used_licenses,
                remaining_licenses: totals.remaining(),
            });
        }

        let users: HashMap<Uuid, _> = self
            .users
            .list_by_account(account_id)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut product_names: HashMap<Uuid, String> = product_allocations
            .iter()
            .map(|p| (p.product.id, p.product.name.clone()))
            .collect();

        let mut details = Vec::new();
        for assignment in self.assignments.list_by_account(account_id).await? {
            // Assignments may reference a product whose subscriptions
            // have all expired; resolve those names individually.
            if !product_names.contains_key(&assignment.product_id) {
                let product = self.products.get_by_id(assignment.product_id).await?;
                product_names.insert(product.id, product.name);
            }
            let product_name = product_names[&assignment.product_id].clone();

            let (user_name, user_email) = match users.get(&assignment.user_id) {
                Some(user) => (user.name.clone(), user.email.clone()),
                None => continue,
            };

            details.push(AssignmentDetail {
                assignment,
                user_name,
                user_email,
                product_name,
            });
        }

        details.sort_by(|a, b| {
            (a.product_name.as_str(), a.user_name.as_str())
                .cmp(&(b.product_name.as_str(), b.user_name.as_str()))
        });

        Ok(AllocationOverview {
            products: product_allocations,
            assignments: details,
        })
    }

    /// Current holders of each selected product, keyed by product id.
    async fn current_holders(
        &self,
        account_id: Uuid,
        products: &[Product],
    ) -> LicentResult<HashMap<Uuid, HashSet<Uuid>>> {
        let mut holders = HashMap::new();
        for product in products {
            let assigned = self
                .assignments
                .assigned_user_ids(account_id, product.id)
                .await?;
            holders.insert(product.id, assigned.into_iter().collect());
        }
        Ok(holders)
    }

    /// Batch-level capacity check: for each product, the number of
    /// selected users not already holding it must fit into the
    /// remaining capacity. Returns the combined violation message, one
    /// clause per violating product.
    async fn capacity_violations(
        &self,
        account_id: Uuid,
        products: &[Product],
        users: &[licent_core::models::user::User],
        holders: &HashMap<Uuid, HashSet<Uuid>>,
        now: DateTime<Utc>,
    ) -> LicentResult<Option<String>> {
        let ledger = EntitlementLedger::new(&self.subscriptions, &self.assignments);
        let mut errors = Vec::new();

        for product in products {
            let held = &holders[&product.id];
            let new_assignments_count =
                users.iter().filter(|u| !held.contains(&u.id)).count() as i64;

            let available = ledger
                .for_product(account_id, product.id, now)
                .await?
                .remaining();

            if new_assignments_count > available {
                errors.push(format!(
                    "{}: Only {} license(s) available, but trying to assign {}",
                    product.name, available, new_assignments_count
                ));
            }
        }

        if errors.is_empty() {
            Ok(None)
        } else {
            Ok(Some(errors.join("; ")))
        }
    }
}
