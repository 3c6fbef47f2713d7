//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for the identity lifecycle
//! (registration, verification, login, token refresh, password management),
//! validate input, and delegate to the `AuthService` for core business logic.

use crate::api::common::{ApiResponse, service_error_to_http, validate_payload};
use crate::auth::models::*;
use crate::auth::provider::{GithubProfile, GoogleProfile, ProviderClaim};
use crate::database::models::Provider;
use crate::errors::ServiceError;
use crate::services::auth_service::{AuthService, ProfileUpdate, Registration};
use crate::services::upload_service::UploadFile;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Json as ResponseJson,
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

type HandlerResult<T> = Result<ResponseJson<ApiResponse<T>>, (StatusCode, String)>;

fn decode_picture(
    picture: Option<ProfilePictureUpload>,
) -> Result<Option<UploadFile>, (StatusCode, String)> {
    let Some(picture) = picture else {
        return Ok(None);
    };
    let bytes = general_purpose::STANDARD.decode(&picture.data).map_err(|e| {
        service_error_to_http(ServiceError::validation(format!("Invalid file data: {e}")))
    })?;
    Ok(Some(UploadFile {
        file_name: picture.file_name,
        mime_type: picture.mime_type,
        bytes,
    }))
}

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<RegisterRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;
    let profile_picture = decode_picture(payload.profile_picture)?;

    let registration = Registration {
        email: payload.email,
        username: payload.username,
        name: payload.name,
        password: payload.password,
        profile_picture,
    };

    match auth_service.register(registration).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Register Successful!"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle email verification request
#[axum::debug_handler]
pub async fn verify_email(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<AccountVerifyRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service
        .validate_account_verify_email(&payload.uid, &payload.token)
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Account email verified"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle resend-verification request
#[axum::debug_handler]
pub async fn resend_verification(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<ResendVerificationRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service
        .resend_account_verification(&payload.email)
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Verification email sent!"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle password login request
#[axum::debug_handler]
pub async fn login(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> HandlerResult<TokenResponse> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service.login(&payload.email, &payload.password).await {
        Ok(pair) => Ok(ResponseJson(ApiResponse::success(
            TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Logged in successfully!",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle Google federated login (profile already verified upstream)
#[axum::debug_handler]
pub async fn google_login(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<GoogleProfile>,
) -> HandlerResult<TokenResponse> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    let claim: ProviderClaim = payload.into();
    match auth_service.federated_login(Provider::Google, claim).await {
        Ok(pair) => Ok(ResponseJson(ApiResponse::success(
            TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Google login successful",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle GitHub federated login (profile already verified upstream)
#[axum::debug_handler]
pub async fn github_login(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<GithubProfile>,
) -> HandlerResult<TokenResponse> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    let claim: ProviderClaim = payload.into();
    match auth_service.federated_login(Provider::Github, claim).await {
        Ok(pair) => Ok(ResponseJson(ApiResponse::success(
            TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Github login successful",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> HandlerResult<TokenResponse> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service
        .refresh_token(&payload.uid, &payload.token)
        .await
    {
        Ok(pair) => Ok(ResponseJson(ApiResponse::success(
            TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "New tokens issued!",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle forget-password request
#[axum::debug_handler]
pub async fn forget_password(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<ForgetPasswordRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service.forget_password(&payload.email).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Password reset email sent"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle reset-password request
#[axum::debug_handler]
pub async fn reset_password(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service
        .reset_password(&payload.uid, &payload.token, &payload.new_password)
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Password successfully reset"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle change-password request (authenticated)
#[axum::debug_handler]
pub async fn change_password(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> HandlerResult<()> {
    validate_payload(&payload).map_err(service_error_to_http)?;

    match auth_service
        .change_password(&claims.sub, &payload.old_password, &payload.new_password)
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::message(
            "Password changed successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request (authenticated): revokes every outstanding secret
#[axum::debug_handler]
pub async fn logout(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<()> {
    match auth_service.logout(&claims.sub).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::message("Logged out successfully"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<UserInfo> {
    match auth_service.get_user_profile(&claims.sub).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            UserInfo::from(user),
            "Request successful",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Update current user's profile
#[axum::debug_handler]
pub async fn update_me(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> HandlerResult<UserInfo> {
    validate_payload(&payload).map_err(service_error_to_http)?;
    let profile_picture = decode_picture(payload.profile_picture)?;

    let update = ProfileUpdate {
        name: payload.name,
        username: payload.username,
        profile_picture,
    };

    match auth_service.update_profile(&claims.sub, update).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            UserInfo::from(user),
            "User updated successfully!",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
