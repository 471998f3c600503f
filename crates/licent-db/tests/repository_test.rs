//! Integration tests for the account, product, user, and subscription
//! repository implementations using in-memory SurrealDB.

use chrono::{Duration, Utc};
use licent_core::models::account::{CreateAccount, UpdateAccount};
use licent_core::models::product::CreateProduct;
use licent_core::models::subscription::CreateSubscription;
use licent_core::models::user::CreateUser;
use licent_core::repository::{
    AccountRepository, ProductRepository, SubscriptionRepository, UserRepository,
};
use licent_db::repository::{
    SurrealAccountRepository, SurrealProductRepository, SurrealSubscriptionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    licent_db::run_migrations(&db).await.unwrap();
    db
}

// -----------------------------------------------------------------------
// Account tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_account() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);

    let account = repo
        .create(CreateAccount {
            name: "ACME Corp".into(),
        })
        .await
        .unwrap();

    assert_eq!(account.name, "ACME Corp");

    let fetched = repo.get_by_id(account.id).await.unwrap();
    assert_eq!(fetched.id, account.id);
    assert_eq!(fetched.name, account.name);
}

#[tokio::test]
async fn update_account_name() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);

    let account = repo
        .create(CreateAccount {
            name: "Before".into(),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            account.id,
            UpdateAccount {
                name: Some("After".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "After");
}

#[tokio::test]
async fn get_missing_account_is_not_found() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        licent_core::error::LicentError::NotFound { .. }
    ));
}

#[tokio::test]
async fn account_delete_cascades_to_owned_rows() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());
    let subscriptions = SurrealSubscriptionRepository::new(db.clone());

    let account = accounts
        .create(CreateAccount {
            name: "Doomed".into(),
        })
        .await
        .unwrap();
    let product = products
        .create(CreateProduct {
            name: "Widget".into(),
            description: "A widget".into(),
        })
        .await
        .unwrap();
    let user = users
        .create(CreateUser {
            account_id: account.id,
            name: "Alice".into(),
            email: "alice@doomed.example".into(),
        })
        .await
        .unwrap();
    subscriptions
        .create(CreateSubscription {
            account_id: account.id,
            product_id: product.id,
            number_of_licenses: 3,
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();

    accounts.delete(account.id).await.unwrap();

    assert!(users.get_by_id(account.id, user.id).await.is_err());
    assert!(
        subscriptions
            .list_by_account(account.id)
            .await
            .unwrap()
            .is_empty()
    );
    // The product survives: products are global, not account-owned.
    assert!(products.get_by_id(product.id).await.is_ok());
}

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn user_lookup_is_account_scoped() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());

    let account_a = accounts
        .create(CreateAccount { name: "A".into() })
        .await
        .unwrap();
    let account_b = accounts
        .create(CreateAccount { name: "B".into() })
        .await
        .unwrap();

    let alice = users
        .create(CreateUser {
            account_id: account_a.id,
            name: "Alice".into(),
            email: "alice@a.example".into(),
        })
        .await
        .unwrap();

    // Resolvable in the owning account, invisible from the other.
    assert!(users.get_by_id(account_a.id, alice.id).await.is_ok());
    assert!(users.get_by_id(account_b.id, alice.id).await.is_err());

    let resolved = users
        .get_for_account(account_b.id, &[alice.id])
        .await
        .unwrap();
    assert!(resolved.is_empty());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());

    let account = accounts
        .create(CreateAccount { name: "A".into() })
        .await
        .unwrap();

    users
        .create(CreateUser {
            account_id: account.id,
            name: "Alice".into(),
            email: "same@example.com".into(),
        })
        .await
        .unwrap();

    let result = users
        .create(CreateUser {
            account_id: account.id,
            name: "Bob".into(),
            email: "same@example.com".into(),
        })
        .await;
    assert!(result.is_err());
}

// -----------------------------------------------------------------------
// Subscription tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn active_license_totals_are_time_relative() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db.clone());
    let subscriptions = SurrealSubscriptionRepository::new(db.clone());

    let account = accounts
        .create(CreateAccount { name: "A".into() })
        .await
        .unwrap();
    let product = products
        .create(CreateProduct {
            name: "Widget".into(),
            description: "A widget".into(),
        })
        .await
        .unwrap();

    let now = Utc::now();

    // Two active subscriptions are additive; the expired one is not
    // counted.
    for (licenses, expires) in [
        (5, now + Duration::days(30)),
        (3, now + Duration::days(60)),
        (100, now - Duration::days(1)),
    ] {
        subscriptions
            .create(CreateSubscription {
                account_id: account.id,
                product_id: product.id,
                number_of_licenses: licenses,
                issued_at: now - Duration::days(90),
                expires_at: expires,
            })
            .await
            .unwrap();
    }

    let total = subscriptions
        .total_licenses_for(account.id, product.id, now)
        .await
        .unwrap();
    assert_eq!(total, 8);

    // After both remaining subscriptions lapse, the total is zero.
    let later = now + Duration::days(90);
    let total = subscriptions
        .total_licenses_for(account.id, product.id, later)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn subscription_create_input_is_validated() {
    let db = setup().await;
    let subscriptions = SurrealSubscriptionRepository::new(db);

    let now = Utc::now();

    let zero_licenses = subscriptions
        .create(CreateSubscription {
            account_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            number_of_licenses: 0,
            issued_at: now,
            expires_at: now + Duration::days(30),
        })
        .await;
    assert!(zero_licenses.is_err());

    let inverted_window = subscriptions
        .create(CreateSubscription {
            account_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            number_of_licenses: 5,
            issued_at: now,
            expires_at: now - Duration::days(1),
        })
        .await;
    assert!(inverted_window.is_err());
}

// -----------------------------------------------------------------------
// Product tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn product_resolution_is_limited_to_subscribed_catalog() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db.clone());
    let subscriptions = SurrealSubscriptionRepository::new(db.clone());

    let account = accounts
        .create(CreateAccount { name: "A".into() })
        .await
        .unwrap();
    let subscribed = products
        .create(CreateProduct {
            name: "Widget".into(),
            description: "A widget".into(),
        })
        .await
        .unwrap();
    let unsubscribed = products
        .create(CreateProduct {
            name: "Gadget".into(),
            description: "A gadget".into(),
        })
        .await
        .unwrap();

    let now = Utc::now();
    subscriptions
        .create(CreateSubscription {
            account_id: account.id,
            product_id: subscribed.id,
            number_of_licenses: 1,
            issued_at: now,
            expires_at: now + Duration::days(30),
        })
        .await
        .unwrap();

    let resolved = products
        .get_for_account(account.id, &[subscribed.id, unsubscribed.id])
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, subscribed.id);
}

#[tokio::test]
async fn list_subscribed_excludes_expired_products_and_orders_by_name() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db.clone());
    let subscriptions = SurrealSubscriptionRepository::new(db.clone());

    let account = accounts
        .create(CreateAccount { name: "A".into() })
        .await
        .unwrap();

    let now = Utc::now();
    for (name, expires) in [
        ("Zephyr", now + Duration::days(10)),
        ("Anvil", now + Duration::days(10)),
        ("Lapsed", now - Duration::days(1)),
    ] {
        let product = products
            .create(CreateProduct {
                name: name.into(),
                description: format!("{name} product"),
            })
            .await
            .unwrap();
        subscriptions
            .create(CreateSubscription {
                account_id: account.id,
                product_id: product.id,
                number_of_licenses: 1,
                issued_at: now - Duration::days(90),
                expires_at: expires,
            })
            .await
            .unwrap();
    }

    let listed = products.list_subscribed(account.id, now).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Anvil", "Zephyr"]);
}
