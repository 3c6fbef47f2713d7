//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like user registration, login, token
//! refreshing, and password management. They are designed to be integrated
//! into the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/login", post(login))
        .route("/google", post(google_login))
        .route("/github", post(github_login))
        .route("/refresh", post(refresh_token))
        .route("/forget-password", post(forget_password))
        .route("/reset-password", post(reset_password))
        .route(
            "/change-password",
            post(change_password).layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/logout",
            post(logout).layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/me",
            get(me)
                .patch(update_me)
                .layer(middleware::from_fn(jwt_auth)),
        )
}
