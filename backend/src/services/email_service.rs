//! SMTP delivery for the mail worker pool.
//!
//! This service talks to the SMTP relay directly and is only invoked from
//! workers; lifecycle operations never call it synchronously.

use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends the account verification email.
    pub async fn send_account_verify_email(
        &self,
        to: &str,
        user_name: &str,
        verification_link: &str,
        year: i32,
    ) -> ServiceResult<()> {
        let html = self.build_verify_html(user_name, verification_link, year);
        let text = self.build_verify_text(user_name, verification_link);
        self.send_email(to, "Verify Your Email!", &html, &text).await
    }

    /// Sends the password reset email.
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> ServiceResult<()> {
        let html = self.build_reset_html(name, reset_url);
        let text = self.build_reset_text(name, reset_url);
        self.send_email(to, "Password Reset Request!", &html, &text)
            .await
    }

    /// Sends a generic email
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::internal_error(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn build_verify_html(&self, user_name: &str, verification_link: &str, year: i32) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <title>Verify your email</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">Welcome aboard!</h2>

                    <p>Hi {user_name},</p>

                    <p>Thanks for signing up. Click the button below to verify your email address:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{verification_link}"
                           style="background-color: #3498db; color: white; padding: 12px 30px;
                                  text-decoration: none; border-radius: 5px; display: inline-block;">
                            Verify Email
                        </a>
                    </div>

                    <p>Or copy and paste this link into your browser:</p>
                    <p style="word-break: break-all; color: #7f8c8d;">{verification_link}</p>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">
                        This link expires shortly. If you didn't create an account,
                        you can safely ignore this email. &copy; {year}
                    </p>
                </div>
            </body>
            </html>
            "#
        )
    }

    fn build_verify_text(&self, user_name: &str, verification_link: &str) -> String {
        format!(
            r#"Welcome aboard!

Hi {user_name},

Thanks for signing up. Open the link below to verify your email address:
{verification_link}

This link expires shortly. If you didn't create an account, you can safely ignore this email.
            "#
        )
    }

    fn build_reset_html(&self, name: &str, reset_url: &str) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <title>Password reset</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">Password reset requested</h2>

                    <p>Hi {name},</p>

                    <p>We received a request to reset your password. Click the button below to choose a new one:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{reset_url}"
                           style="background-color: #3498db; color: white; padding: 12px 30px;
                                  text-decoration: none; border-radius: 5px; display: inline-block;">
                            Reset Password
                        </a>
                    </div>

                    <p>Or copy and paste this link into your browser:</p>
                    <p style="word-break: break-all; color: #7f8c8d;">{reset_url}</p>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">
                        This link expires in 15 minutes. If you didn't request a reset,
                        you can safely ignore this email.
                    </p>
                </div>
            </body>
            </html>
            "#
        )
    }

    fn build_reset_text(&self, name: &str, reset_url: &str) -> String {
        format!(
            r#"Password reset requested

Hi {name},

We received a request to reset your password. Open the link below to choose a new one:
{reset_url}

This link expires in 15 minutes. If you didn't request a reset, you can safely ignore this email.
            "#
        )
    }
}
