//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, cache and notifier operations.

mod account;
mod blog;
mod engagement;

pub use account::{AccountService, SignedIn};
pub use blog::{BlogChanges, BlogService, POPULAR_LIMIT};
pub use engagement::EngagementService;

