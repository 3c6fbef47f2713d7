//! Binary upload pipeline entry point.
//!
//! Validates the file, enqueues the object write, and returns the public URL
//! computed from the deterministic key. The S3 write itself happens later on
//! the uploader pool, so the returned URL may 404 until the worker finishes.

use crate::errors::{ServiceError, ServiceResult};
use crate::queue::{JobDispatcher, JobPayload};
use crate::utils::secrets::SecretHasher;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

const ALLOWED_MIME_TYPES: &[&str] = &["image/gif", "image/jpg", "image/jpeg", "image/png"];

/// An uploaded file held fully in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct UploadService {
    queue: Arc<dyn JobDispatcher>,
    hasher: SecretHasher,
    bucket_name: String,
    public_base_url: String,
}

impl UploadService {
    pub fn new(
        queue: Arc<dyn JobDispatcher>,
        bucket_name: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            hasher: SecretHasher,
            bucket_name: bucket_name.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Enqueues the object write and returns the public URL for the key.
    pub async fn upload_and_get_url(&self, file: &UploadFile) -> ServiceResult<String> {
        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(ServiceError::validation("Mime type not supported"));
        }

        let key = self.generate_file_name(&file.file_name);
        self.queue
            .enqueue(JobPayload::UploadImage {
                buffer: general_purpose::STANDARD.encode(&file.bytes),
                mime_type: file.mime_type.clone(),
                bucket_name: self.bucket_name.clone(),
                key: key.clone(),
            })
            .await?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    /// Builds a collision-free object key, preserving the file extension.
    fn generate_file_name(&self, original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            self.hasher.generate_token(16),
            ext
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryJobQueue;

    fn service_with_queue() -> (UploadService, Arc<InMemoryJobQueue>) {
        let queue = Arc::new(InMemoryJobQueue::new("uploader", 3));
        let service = UploadService::new(queue.clone(), "test-bucket", "https://cdn.test");
        (service, queue)
    }

    fn png_file() -> UploadFile {
        UploadFile {
            file_name: "avatar.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: b"fake png bytes".to_vec(),
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_mime_type() {
        let (service, queue) = service_with_queue();
        let err = service
            .upload_and_get_url(&UploadFile {
                file_name: "cv.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn enqueues_upload_and_returns_public_url() {
        let (service, queue) = service_with_queue();
        let url = service.upload_and_get_url(&png_file()).await.unwrap();

        let job = queue.dequeue().await.expect("upload job");
        match job.payload {
            JobPayload::UploadImage {
                buffer,
                mime_type,
                bucket_name,
                key,
            } => {
                assert_eq!(bucket_name, "test-bucket");
                assert_eq!(mime_type, "image/png");
                assert!(key.ends_with(".png"));
                assert_eq!(url, format!("https://cdn.test/{key}"));
                let decoded = general_purpose::STANDARD.decode(buffer).unwrap();
                assert_eq!(decoded, b"fake png bytes");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn keys_are_unique_per_upload() {
        let (service, queue) = service_with_queue();
        let a = service.upload_and_get_url(&png_file()).await.unwrap();
        let b = service.upload_and_get_url(&png_file()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(queue.len().await, 2);
    }
}
