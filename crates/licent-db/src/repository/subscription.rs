//! SurrealDB implementation of [`SubscriptionRepository`].
//!
//! Activity is never stored: every aggregate takes the evaluation
//! instant as a bound parameter so the sum of active licenses is
//! computed fresh on each call.

use chrono::{DateTime, Utc};
use licent_core::error::LicentResult;
use licent_core::models::subscription::{CreateSubscription, Subscription};
use licent_core::repository::SubscriptionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SubscriptionRow {
    account_id: String,
    product_id: String,
    number_of_licenses: u32,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SubscriptionRowWithId {
    record_id: String,
    account_id: String,
    product_id: String,
    number_of_licenses: u32,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self, id: Uuid) -> Result<Subscription, DbError> {
        let account_id = Uuid::parse_str(&self.account_id)
            .map_err(|e| DbError::Migration(format!("invalid account UUID: {e}")))?;
        let product_id = Uuid::parse_str(&self.product_id)
            .map_err(|e| DbError::Migration(format!("invalid product UUID: {e}")))?;
        Ok(Subscription {
            id,
            account_id,
            product_id,
            number_of_licenses: self.number_of_licenses,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl SubscriptionRowWithId {
    fn try_into_subscription(self) -> Result<Subscription, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let account_id = Uuid::parse_str(&self.account_id)
            .map_err(|e| DbError::Migration(format!("invalid account UUID: {e}")))?;
        let product_id = Uuid::parse_str(&self.product_id)
            .map_err(|e| DbError::Migration(format!("invalid product UUID: {e}")))?;
        Ok(Subscription {
            id,
            account_id,
            product_id,
            number_of_licenses: self.number_of_licenses,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// Row struct for license-sum queries.
#[derive(Debug, SurrealValue)]
struct SumRow {
    total: i64,
}

/// SurrealDB implementation of the Subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn create(&self, input: CreateSubscription) -> LicentResult<Subscription> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('subscription', $id) SET \
                 account_id = $account_id, \
                 product_id = $product_id, \
                 number_of_licenses = $number_of_licenses, \
                 issued_at = $issued_at, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("account_id", input.account_id.to_string()))
            .bind(("product_id", input.product_id.to_string()))
            .bind(("number_of_licenses", input.number_of_licenses))
            .bind(("issued_at", input.issued_at))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: id_str,
        })?;

        Ok(row.into_subscription(id)?)
    }

    async fn get_by_id(&self, account_id: Uuid, id: Uuid) -> LicentResult<Subscription> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('subscription', $id) \
                 WHERE account_id = $account_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: id_str,
        })?;

        Ok(row.into_subscription(id)?)
    }

    async fn list_for_product(
        &self,
        account_id: Uuid,
        product_id: Uuid,
    ) -> LicentResult<Vec<Subscription>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE account_id = $account_id \
                 AND product_id = $product_id \
                 ORDER BY expires_at ASC",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("product_id", product_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_subscription().map_err(Into::into))
            .collect()
    }

    async fn list_by_account(&self, account_id: Uuid) -> LicentResult<Vec<Subscription>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE account_id = $account_id \
                 ORDER BY expires_at ASC",
            )
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_subscription().map_err(Into::into))
            .collect()
    }

    async fn total_licenses_for(
        &self,
        account_id: Uuid,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> LicentResult<i64> {
        let mut result = self
            .db
            .query(
                "SELECT math::sum(number_of_licenses) AS total \
                 FROM subscription \
                 WHERE account_id = $account_id \
                 AND product_id = $product_id \
                 AND expires_at > $at \
                 GROUP ALL",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("product_id", product_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SumRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn delete(&self, account_id: Uuid, id: Uuid) -> LicentResult<()> {
        self.db
            .query(
                "DELETE type::record('subscription', $id) \
                 WHERE account_id = $account_id",
            )
            .bind(("id", id.to_string()))
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
