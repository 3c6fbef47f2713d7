//! Enqueue-only facade for outbound mail.
//!
//! Lifecycle operations hand a fully-formed payload to the mailer queue and
//! return as soon as the enqueue is acknowledged; the worker pool owns
//! delivery and retries.

use crate::errors::ServiceResult;
use crate::queue::{JobDispatcher, JobPayload};
use chrono::{Datelike, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct MailService {
    queue: Arc<dyn JobDispatcher>,
}

impl MailService {
    pub fn new(queue: Arc<dyn JobDispatcher>) -> Self {
        Self { queue }
    }

    /// Enqueues an account verification email.
    pub async fn send_account_verify_email(
        &self,
        to: &str,
        user_name: &str,
        verification_link: &str,
    ) -> ServiceResult<()> {
        self.queue
            .enqueue(JobPayload::VerifyEmail {
                to: to.to_string(),
                user_name: user_name.to_string(),
                verification_link: verification_link.to_string(),
                year: Utc::now().year(),
            })
            .await
    }

    /// Enqueues a password reset email.
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> ServiceResult<()> {
        self.queue
            .enqueue(JobPayload::ResetPasswordEmail {
                to: to.to_string(),
                name: name.to_string(),
                reset_url: reset_url.to_string(),
            })
            .await
    }
}
