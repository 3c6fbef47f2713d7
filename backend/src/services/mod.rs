//! Business logic services.

pub mod auth_service;
pub mod email_service;
pub mod mail_service;
pub mod upload_service;
