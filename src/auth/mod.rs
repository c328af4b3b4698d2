//! Authentication
//!
//! Handles:
//! - Token issuing and verification (HS256 JWT)
//! - Password hashing (bcrypt)
//! - Authentication middleware

mod middleware;
pub mod password;
pub mod token;

pub use middleware::{CurrentUser, Principal, require_auth};
pub use password::{hash_password, verify_password};
pub use token::{Claims, create_token, verify_token};
