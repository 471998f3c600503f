//! SurrealDB repository implementations.

mod account;
mod assignment;
mod product;
mod subscription;
mod user;

pub use account::SurrealAccountRepository;
pub use assignment::SurrealAssignmentRepository;
pub use product::SurrealProductRepository;
pub use subscription::SurrealSubscriptionRepository;
pub use user::SurrealUserRepository;
