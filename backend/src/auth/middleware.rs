//! Middleware for protecting authenticated routes.
//!
//! Validates the Bearer access token and makes the verified claims available
//! to handlers through request extensions.

use crate::utils::jwt::JwtIssuer;
use axum::{
    extract::{Extension, Request},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// JWT authentication middleware
pub async fn jwt_auth(
    Extension(jwt): Extension<Arc<JwtIssuer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match jwt.verify_access(token) {
        Ok(claims) => {
            // Make claims available to handlers
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
