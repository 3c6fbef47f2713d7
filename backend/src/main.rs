//! Main entry point for the identity backend.
//!
//! This file initializes the Axum web server, sets up the database
//! connection, starts the mail and upload worker pools, and registers all
//! API routes and middleware. It orchestrates the application's startup and
//! defines its overall structure.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod queue;
mod repositories;
mod services;
mod storage;
mod utils;

use crate::api::common::ApiResponse;
use crate::config::Config;
use crate::database::Database;
use crate::queue::InMemoryJobQueue;
use crate::queue::worker::{SideEffectRunner, WorkerPool};
use crate::repositories::user_repository::SqliteUserRepository;
use crate::services::auth_service::AuthService;
use crate::services::email_service::EmailService;
use crate::services::mail_service::MailService;
use crate::services::upload_service::UploadService;
use crate::storage::{S3Storage, StorageClient};
use crate::utils::jwt::JwtIssuer;
use crate::utils::secrets::SecretHasher;
use axum::{Extension, Router, response::Json, routing::get};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::init;

const MAX_JOB_RETRIES: u32 = 3;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    let pool = db.pool().clone();

    let mailer_queue = Arc::new(InMemoryJobQueue::new("mailer", MAX_JOB_RETRIES));
    let uploader_queue = Arc::new(InMemoryJobQueue::new("uploader", MAX_JOB_RETRIES));

    let email_service = match config.email_config() {
        Some(email_config) => match EmailService::new(email_config) {
            Ok(service) => {
                info!("Email service initialized successfully");
                Some(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize email service: {}. Email delivery will be disabled.",
                    e
                );
                None
            }
        },
        None => {
            tracing::warn!("Email configuration not found. Email delivery will be disabled.");
            None
        }
    };

    let storage_client: Option<Arc<dyn StorageClient>> = match config.storage_config() {
        Some(storage_config) => {
            Some(Arc::new(S3Storage::new(&storage_config).await) as Arc<dyn StorageClient>)
        }
        None => {
            tracing::warn!("Storage configuration not found. Uploads will be disabled.");
            None
        }
    };

    let runner = Arc::new(SideEffectRunner::new(email_service, storage_client));
    let _mail_pool = WorkerPool::start(
        mailer_queue.clone(),
        runner.clone(),
        config.mail_worker_count,
    );
    let _upload_pool = WorkerPool::start(uploader_queue.clone(), runner, config.upload_worker_count);

    let jwt = JwtIssuer::new(&config);
    let store = Arc::new(SqliteUserRepository::new(pool));
    let mail = MailService::new(mailer_queue);
    let upload = UploadService::new(
        uploader_queue,
        config.upload_bucket.clone(),
        config.upload_public_url.clone(),
    );
    let auth_service = Arc::new(AuthService::new(
        store,
        SecretHasher,
        jwt.clone(),
        mail,
        upload,
        config.base_url.clone(),
    ));

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .layer(Extension(auth_service))
        .layer(Extension(Arc::new(jwt)));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting identity server on port {}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Identity Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Identity API",
    ))
}
