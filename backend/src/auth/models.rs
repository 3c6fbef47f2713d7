//! Data structures for authentication-related entities.
//!
//! This module defines request and response payloads for the authentication
//! flow, used for data transfer between the HTTP layer and the services.

use crate::database::models::{Provider, User};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Username must be between 1-255 characters"
    ))]
    pub username: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(nested)]
    pub profile_picture: Option<ProfilePictureUpload>,
}

/// Inline profile picture, base64-encoded by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfilePictureUpload {
    #[validate(length(min = 1, message = "File name is required"))]
    pub file_name: String,

    #[validate(length(min = 1, message = "Mime type is required"))]
    pub mime_type: String,

    #[validate(length(min = 1, message = "File data is required"))]
    pub data: String,
}

/// Email verification request payload
#[derive(Debug, Deserialize, Validate)]
pub struct AccountVerifyRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub uid: String,

    #[validate(length(min = 1, message = "Verification token is required"))]
    pub token: String,
}

/// Resend-verification request payload
#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub uid: String,

    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub token: String,
}

/// Forget-password request payload
#[derive(Debug, Deserialize, Validate)]
pub struct ForgetPasswordRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

/// Reset-password request payload
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub uid: String,

    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Change-password request payload (user taken from the access token)
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Profile update request payload
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Username must be between 1-255 characters"
    ))]
    pub username: Option<String>,

    #[validate(nested)]
    pub profile_picture: Option<ProfilePictureUpload>,
}

/// Token pair returned by login, federated login, and refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Public user shape returned to clients
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub provider: Provider,
    pub profile_picture_url: Option<String>,
    pub role: String,
    pub email_verified: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
            provider: user.provider,
            profile_picture_url: user.profile_picture_url,
            role: user.role,
            email_verified: user.email_verified,
        }
    }
}
