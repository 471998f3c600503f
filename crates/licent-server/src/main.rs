//! Licent Server — Application entry point.
//!
//! Bootstraps logging, connects to SurrealDB, and applies schema
//! migrations. Presentation layers (HTTP, admin CRUD) live outside
//! this repository and consume the allocation engine as a library.

use licent_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("licent=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Licent server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = licent_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    tracing::info!("Licent server ready.");
}
