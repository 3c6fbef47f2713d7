//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, token secrets, SMTP credentials, and object-storage
//! settings.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expires_in_seconds: u64,
    pub refresh_token_expires_in_seconds: u64,
    pub server_port: u16,
    /// Public base URL used in verification and reset links.
    pub base_url: String,
    pub upload_bucket: String,
    /// CDN base the upload keys are served from.
    pub upload_public_url: String,
    pub mail_worker_count: usize,
    pub upload_worker_count: usize,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    from_name: Option<String>,
    from_email: Option<String>,
    aws_endpoint_url: Option<String>,
    aws_region: Option<String>,
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<String>,
}

/// SMTP settings for the outbound mail worker.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

/// Object-storage settings for the upload worker.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint_url: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET not set")?;

        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET not set")?;

        let access_token_expires_in_seconds = env::var("ACCESS_TOKEN_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("ACCESS_TOKEN_EXPIRES_IN_SECONDS must be a valid number")?;

        let refresh_token_expires_in_seconds = env::var("REFRESH_TOKEN_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("REFRESH_TOKEN_EXPIRES_IN_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));

        let upload_bucket = env::var("AWS_PUBLIC_BUCKET").unwrap_or_else(|_| "uploads".to_string());

        let upload_public_url = env::var("AWS_CLOUDFRONT_URL")
            .unwrap_or_else(|_| format!("{}/uploads", base_url));

        let mail_worker_count = env::var("MAIL_WORKER_COUNT")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .context("MAIL_WORKER_COUNT must be a valid number")?;

        let upload_worker_count = env::var("UPLOAD_WORKER_COUNT")
            .unwrap_or_else(|_| "4".to_string())
            .parse::<usize>()
            .context("UPLOAD_WORKER_COUNT must be a valid number")?;

        let smtp_port = match env::var("SMTP_PORT") {
            Ok(port) => Some(port.parse::<u16>().context("SMTP_PORT must be a valid number")?),
            Err(_) => None,
        };

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            access_token_secret,
            refresh_token_secret,
            access_token_expires_in_seconds,
            refresh_token_expires_in_seconds,
            server_port,
            base_url,
            upload_bucket,
            upload_public_url,
            mail_worker_count,
            upload_worker_count,
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            from_name: env::var("MAIL_FROM_NAME").ok(),
            from_email: env::var("MAIL_FROM_EMAIL").ok(),
            aws_endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
        })
    }

    /// Returns the email configuration when every SMTP variable is present.
    pub fn email_config(&self) -> Option<EmailConfig> {
        Some(EmailConfig {
            smtp_host: self.smtp_host.clone()?,
            smtp_port: self.smtp_port?,
            smtp_username: self.smtp_username.clone()?,
            smtp_password: self.smtp_password.clone()?,
            from_name: self.from_name.clone()?,
            from_email: self.from_email.clone()?,
        })
    }

    /// Returns the storage configuration when the AWS credentials are present.
    pub fn storage_config(&self) -> Option<StorageConfig> {
        Some(StorageConfig {
            endpoint_url: self.aws_endpoint_url.clone(),
            region: self
                .aws_region
                .clone()
                .unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id: self.aws_access_key_id.clone()?,
            secret_access_key: self.aws_secret_access_key.clone()?,
        })
    }
}
