//! SurrealDB implementation of [`AssignmentRepository`].
//!
//! `create_batch` is the mutation boundary of the allocation engine:
//! every row is written inside one SurrealQL transaction that re-checks
//! tenant ownership, subscription presence, and capacity *after* the
//! inserts. A concurrent bulk assignment that passed its own pre-flight
//! on stale numbers therefore cancels the whole transaction instead of
//! over-allocating. The unique (user_id, product_id, account_id) index
//! covers the duplicate-row race the same way.

use chrono::{DateTime, Utc};
use licent_core::error::LicentResult;
use licent_core::models::assignment::{CreateLicenseAssignment, LicenseAssignment};
use licent_core::repository::AssignmentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AssignmentRowWithId {
    record_id: String,
    account_id: String,
    user_id: String,
    product_id: String,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRowWithId {
    fn try_into_assignment(self) -> Result<LicenseAssignment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let account_id = Uuid::parse_str(&self.account_id)
            .map_err(|e| DbError::Migration(format!("invalid account UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let product_id = Uuid::parse_str(&self.product_id)
            .map_err(|e| DbError::Migration(format!("invalid product UUID: {e}")))?;
        Ok(LicenseAssignment {
            id,
            account_id,
            user_id,
            product_id,
            assigned_at: self.assigned_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: i64,
}

/// Pre-assigned row passed into the batch transaction.
#[derive(Debug, Clone, SurrealValue)]
struct NewAssignmentRow {
    id: String,
    user_id: String,
    product_id: String,
}

/// Batch insert with commit-time re-validation of the write invariants.
///
/// The inserts come first; the per-product checks then see the
/// post-insert state, so `used > total` detects any over-allocation
/// introduced by this batch or by a concurrently committed one.
const CREATE_BATCH_SQL: &str = "\
BEGIN TRANSACTION; \
FOR $row IN $rows { \
    LET $owner = (SELECT VALUE account_id \
        FROM type::record('user', $row.user_id))[0]; \
    IF $owner != $account_id { \
        THROW 'User must belong to the specified account'; \
    }; \
    CREATE type::record('license_assignment', $row.id) SET \
        account_id = $account_id, \
        user_id = $row.user_id, \
        product_id = $row.product_id, \
        assigned_at = $at; \
}; \
FOR $pid IN $product_ids { \
    LET $total = math::sum((SELECT VALUE number_of_licenses \
        FROM subscription \
        WHERE account_id = $account_id \
        AND product_id = $pid \
        AND expires_at > $at)); \
    LET $used = array::len((SELECT VALUE id \
        FROM license_assignment \
        WHERE account_id = $account_id \
        AND product_id = $pid)); \
    IF $total == 0 { \
        THROW 'No active subscription found for this product'; \
    }; \
    IF $used > $total { \
        THROW 'No available licenses for this product'; \
    }; \
}; \
COMMIT TRANSACTION;";

/// SurrealDB implementation of the Assignment repository.
#[derive(Clone)]
pub struct SurrealAssignmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAssignmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AssignmentRepository for SurrealAssignmentRepository<C> {
    async fn create_batch(
        &self,
        account_id: Uuid,
        rows: &[CreateLicenseAssignment],
        at: DateTime<Utc>,
    ) -> LicentResult<Vec<LicenseAssignment>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut new_rows = Vec::with_capacity(rows.len());
        let mut created = Vec::with_capacity(rows.len());
        let mut product_ids: Vec<String> = Vec::new();

        for row in rows {
            let id = Uuid::new_v4();
            new_rows.push(NewAssignmentRow {
                id: id.to_string(),
                user_id: row.user_id.to_string(),
                product_id: row.product_id.to_string(),
            });
            created.push(LicenseAssignment {
                id,
                account_id,
                user_id: row.user_id,
                product_id: row.product_id,
                assigned_at: at,
            });
            let pid = row.product_id.to_string();
            if !product_ids.contains(&pid) {
                product_ids.push(pid);
            }
        }

        debug!(
            account_id = %account_id,
            rows = new_rows.len(),
            products = product_ids.len(),
            "Writing assignment batch"
        );

        self.db
            .query(CREATE_BATCH_SQL)
            .bind(("account_id", account_id.to_string()))
            .bind(("rows", new_rows))
            .bind(("product_ids", product_ids))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(created)
    }

    async fn delete_batch(&self, account_id: Uuid, ids: &[Uuid]) -> LicentResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        // Count the account's matching rows first, then delete them in
        // one atomic statement. Ids outside the account never match.
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM license_assignment \
                 WHERE account_id = $account_id \
                 AND meta::id(id) IN $ids GROUP ALL; \
                 DELETE license_assignment \
                 WHERE account_id = $account_id \
                 AND meta::id(id) IN $ids;",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let removed = count_rows.first().map(|r| r.total).unwrap_or(0);

        debug!(account_id = %account_id, removed, "Removed assignment batch");

        Ok(removed.max(0) as u64)
    }

    async fn count_for_product(&self, account_id: Uuid, product_id: Uuid) -> LicentResult<i64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM license_assignment \
                 WHERE account_id = $account_id \
                 AND product_id = $product_id GROUP ALL",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("product_id", product_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn assigned_user_ids(
        &self,
        account_id: Uuid,
        product_id: Uuid,
    ) -> LicentResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE user_id FROM license_assignment \
                 WHERE account_id = $account_id \
                 AND product_id = $product_id",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("product_id", product_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<String> = result.take(0).map_err(DbError::from)?;
        raw.iter()
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")).into())
            })
            .collect()
    }

    async fn list_by_account(&self, account_id: Uuid) -> LicentResult<Vec<LicenseAssignment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM license_assignment \
                 WHERE account_id = $account_id \
                 ORDER BY assigned_at ASC",
            )
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_assignment().map_err(Into::into))
            .collect()
    }
}
