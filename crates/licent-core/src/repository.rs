//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Account-scoped repositories
//! require an `account_id` parameter to enforce tenant isolation: no
//! implementation may read or write rows outside the supplied account.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LicentResult;
use crate::models::{
    account::{Account, CreateAccount, UpdateAccount},
    assignment::{CreateLicenseAssignment, LicenseAssignment},
    product::{CreateProduct, Product},
    subscription::{CreateSubscription, Subscription},
    user::{CreateUser, User},
};

// ---------------------------------------------------------------------------
// Global scope
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    fn create(&self, input: CreateAccount) -> impl Future<Output = LicentResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LicentResult<Account>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAccount,
    ) -> impl Future<Output = LicentResult<Account>> + Send;
    /// Deletes the account together with its users, subscriptions, and
    /// license assignments.
    fn delete(&self, id: Uuid) -> impl Future<Output = LicentResult<()>> + Send;
    fn list(&self) -> impl Future<Output = LicentResult<Vec<Account>>> + Send;
}

pub trait ProductRepository: Send + Sync {
    fn create(&self, input: CreateProduct) -> impl Future<Output = LicentResult<Product>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LicentResult<Product>> + Send;
    fn list(&self) -> impl Future<Output = LicentResult<Vec<Product>>> + Send;
    /// Resolves `ids` against the products the account holds any
    /// subscription for (active or expired). Products outside that set
    /// are omitted from the result.
    fn get_for_account(
        &self,
        account_id: Uuid,
        ids: &[Uuid],
    ) -> impl Future<Output = LicentResult<Vec<Product>>> + Send;
    /// Products backed by at least one subscription active at `at`,
    /// ordered by name.
    fn list_subscribed(
        &self,
        account_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = LicentResult<Vec<Product>>> + Send;
}

// ---------------------------------------------------------------------------
// Account-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = LicentResult<User>> + Send;
    fn get_by_id(
        &self,
        account_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = LicentResult<User>> + Send;
    /// Resolves `ids` within the account; ids belonging to other
    /// accounts are omitted from the result.
    fn get_for_account(
        &self,
        account_id: Uuid,
        ids: &[Uuid],
    ) -> impl Future<Output = LicentResult<Vec<User>>> + Send;
    /// Deletes the user together with their license assignments.
    fn delete(&self, account_id: Uuid, id: Uuid) -> impl Future<Output = LicentResult<()>> + Send;
    fn list_by_account(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = LicentResult<Vec<User>>> + Send;
}

pub trait SubscriptionRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSubscription,
    ) -> impl Future<Output = LicentResult<Subscription>> + Send;
    fn get_by_id(
        &self,
        account_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = LicentResult<Subscription>> + Send;
    fn list_for_product(
        &self,
        account_id: Uuid,
        product_id: Uuid,
    ) -> impl Future<Output = LicentResult<Vec<Subscription>>> + Send;
    fn list_by_account(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = LicentResult<Vec<Subscription>>> + Send;
    /// Sum of `number_of_licenses` over subscriptions for the pair that
    /// are active at `at`. Computed fresh on every call.
    fn total_licenses_for(
        &self,
        account_id: Uuid,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = LicentResult<i64>> + Send;
    fn delete(&self, account_id: Uuid, id: Uuid) -> impl Future<Output = LicentResult<()>> + Send;
}

pub trait AssignmentRepository: Send + Sync {
    /// Inserts `rows` as one atomic transaction and re-validates
    /// capacity and subscription presence inside it, with activity
    /// evaluated at `at`. Either every row is written or none is. The
    /// (user_id, product_id, account_id) uniqueness constraint is
    /// enforced by the store.
    fn create_batch(
        &self,
        account_id: Uuid,
        rows: &[CreateLicenseAssignment],
        at: DateTime<Utc>,
    ) -> impl Future<Output = LicentResult<Vec<LicenseAssignment>>> + Send;
    /// Deletes the listed assignments, restricted to rows of
    /// `account_id`; ids outside that scope are ignored. Returns the
    /// number of rows actually removed.
    fn delete_batch(
        &self,
        account_id: Uuid,
        ids: &[Uuid],
    ) -> impl Future<Output = LicentResult<u64>> + Send;
    /// Count of assignment rows for the pair, regardless of current
    /// subscription state.
    fn count_for_product(
        &self,
        account_id: Uuid,
        product_id: Uuid,
    ) -> impl Future<Output = LicentResult<i64>> + Send;
    /// The users of this account currently holding the product.
    fn assigned_user_ids(
        &self,
        account_id: Uuid,
        product_id: Uuid,
    ) -> impl Future<Output = LicentResult<Vec<Uuid>>> + Send;
    fn list_by_account(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = LicentResult<Vec<LicenseAssignment>>> + Send;
}
