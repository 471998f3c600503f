//! Licent Core — domain models, repository contracts, and shared error
//! types for the license entitlement platform.
//!
//! This crate has no I/O: storage backends implement the traits in
//! [`repository`], and the allocation engine consumes them.

pub mod clock;
pub mod error;
pub mod models;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LicentError, LicentResult};
