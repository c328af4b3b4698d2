//! Account service
//!
//! Registration, sign-in and the password reset flow.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::auth::{create_token, hash_password, verify_password};
use crate::config::AuthConfig;
use crate::data::{Database, NewUser, User};
use crate::error::AppError;
use crate::notify::Notifier;

/// Uniformly random six digit code, zero padded
fn generate_reset_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    auth: AuthConfig,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>, auth: AuthConfig) -> Self {
        Self { db, notifier, auth }
    }

    fn issue_token(&self, email: &str) -> Result<String, AppError> {
        create_token(
            email,
            &self.auth.jwt_secret,
            Duration::hours(self.auth.token_ttl_hours),
        )
    }

    async fn find_user(&self, email: &str) -> Result<User, AppError> {
        self.db
            .get_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Register a new user
    ///
    /// # Returns
    /// A token for the new user
    ///
    /// # Errors
    /// `Conflict` if the email or username is already registered
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AppError> {
        let username = required(username, "username")?;
        let email = required(email, "email")?;
        if password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }
        if self.db.get_user_by_username(&username).await?.is_some() {
            return Err(AppError::conflict("Username is already taken"));
        }

        let password_hash = hash_password(password, self.auth.bcrypt_cost).await?;
        let user = self
            .db
            .insert_user(&NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        crate::metrics::SIGNUPS_TOTAL.inc();
        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        self.issue_token(&user.email)
    }

    /// Sign in with email and password
    ///
    /// # Errors
    /// `NotFound` for an unknown email, `Unauthorized` for a wrong password
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SignedIn, AppError> {
        let user = self.find_user(email).await?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = user.id, "Incorrect password");
            return Err(AppError::unauthorized("Incorrect password"));
        }

        let token = self.issue_token(&user.email)?;
        Ok(SignedIn { token, user })
    }

    /// Generate, store and send a reset code
    ///
    /// A new request replaces any earlier code.
    pub async fn request_reset_code(&self, email: &str) -> Result<(), AppError> {
        let user = self.find_user(email).await?;

        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::minutes(self.auth.reset_code_ttl_minutes);
        self.db.set_reset_code(user.id, &code, expires_at).await?;

        self.notifier
            .send_reset_code(&user.email, &code)
            .await
            .map_err(|error| {
                tracing::error!(user_id = user.id, %error, "Error sending reset code");
                AppError::Internal(anyhow::anyhow!("Failed to send email"))
            })?;

        tracing::info!(user_id = user.id, "Reset code sent");
        Ok(())
    }

    /// Check a reset code and, on success, authorize one password reset
    ///
    /// The code is consumed; the authorization lasts until the code would
    /// have expired.
    ///
    /// # Errors
    /// `Unauthorized` if the code does not match or has expired
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        let user = self.find_user(email).await?;
        let invalid = || AppError::unauthorized("Invalid or expired code");

        let (Some(stored), Some(expires_at)) = (&user.reset_code, user.reset_code_expires_at)
        else {
            return Err(invalid());
        };
        if stored != code.trim() || expires_at <= Utc::now() {
            return Err(invalid());
        }

        if !self.db.consume_reset_code(user.id, stored, expires_at).await? {
            // Another request consumed it first
            return Err(invalid());
        }

        tracing::info!(user_id = user.id, "Reset code verified");
        Ok(())
    }

    /// Replace the password after a successful [`Self::verify_reset_code`]
    ///
    /// # Errors
    /// `Unauthorized` if no verified, unexpired reset is pending
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AppError> {
        let user = self.find_user(email).await?;
        if new_password.is_empty() {
            return Err(AppError::validation("new_password is required"));
        }

        let authorized = user
            .reset_authorized_until
            .is_some_and(|until| until > Utc::now());
        if !authorized {
            return Err(AppError::unauthorized("Reset code not verified"));
        }

        let password_hash = hash_password(new_password, self.auth.bcrypt_cost).await?;
        if !self.db.reset_password(user.id, &password_hash).await? {
            return Err(AppError::unauthorized("Reset code not verified"));
        }

        tracing::info!(user_id = user.id, "Password updated");
        Ok(())
    }
}
