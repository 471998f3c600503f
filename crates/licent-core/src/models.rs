//! Domain models for Licent.
//!
//! These are the core types shared across all crates. Accounts own
//! users, subscriptions, and license assignments; products are global.

pub mod account;
pub mod assignment;
pub mod product;
pub mod subscription;
pub mod user;
