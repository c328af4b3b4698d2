//! Outgoing notifications
//!
//! Reset codes leave the system through a [`Notifier`]. Delivery
//! mechanics (SMTP and friends) live behind this seam; the shipped
//! [`LogNotifier`] only records that a code was issued.

use async_trait::async_trait;

use crate::error::AppError;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a password reset code to `email`
    async fn send_reset_code(&self, email: &str, code: &str) -> Result<(), AppError>;
}

/// Notifier that writes to the log instead of sending mail
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_code(&self, email: &str, _code: &str) -> Result<(), AppError> {
        // The code itself is a credential and stays out of the log.
        tracing::info!(
            from = %self.sender,
            to = %email,
            subject = "Password Reset Code",
            "Reset code issued"
        );
        Ok(())
    }
}
