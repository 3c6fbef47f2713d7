//! Typed job queue for asynchronous side effects.
//!
//! Lifecycle operations enqueue jobs and return immediately; independent
//! worker pools (see [`worker`]) drain the queues. Delivery is at-least-once:
//! a failed job is requeued until its attempt budget is spent.

pub mod worker;

use crate::errors::ServiceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Payload of one background job.
///
/// The serialized form carries a `kind` tag (`verify-email`,
/// `reset-password-email`, `upload-image`), which is also the wire contract
/// the workers consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobPayload {
    VerifyEmail {
        to: String,
        user_name: String,
        verification_link: String,
        year: i32,
    },
    ResetPasswordEmail {
        to: String,
        name: String,
        reset_url: String,
    },
    UploadImage {
        /// Base64-encoded file contents.
        buffer: String,
        mime_type: String,
        bucket_name: String,
        key: String,
    },
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::VerifyEmail { .. } => "verify-email",
            JobPayload::ResetPasswordEmail { .. } => "reset-password-email",
            JobPayload::UploadImage { .. } => "upload-image",
        }
    }
}

/// A queued job plus its retry bookkeeping.
#[derive(Debug, Clone)]
pub struct JobData {
    pub job_id: String,
    pub attempts: u32,
    pub max_retries: u32,
    pub payload: JobPayload,
}

/// At-least-once enqueue of background jobs.
///
/// Enqueue acknowledges acceptance only; callers never wait on delivery.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn enqueue(&self, payload: JobPayload) -> ServiceResult<()>;
}

/// In-memory FIFO queue suitable for a single-instance deployment.
#[derive(Clone)]
pub struct InMemoryJobQueue {
    name: &'static str,
    pending: Arc<Mutex<VecDeque<JobData>>>,
    max_retries: u32,
}

impl InMemoryJobQueue {
    pub fn new(name: &'static str, max_retries: u32) -> Self {
        Self {
            name,
            pending: Arc::new(Mutex::new(VecDeque::new())),
            max_retries,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Takes the next pending job, if any.
    pub(crate) async fn dequeue(&self) -> Option<JobData> {
        self.pending.lock().await.pop_front()
    }

    /// Returns a failed job to the back of the queue with one more attempt
    /// recorded.
    pub(crate) async fn requeue(&self, mut job: JobData) {
        job.attempts += 1;
        self.pending.lock().await.push_back(job);
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[async_trait]
impl JobDispatcher for InMemoryJobQueue {
    async fn enqueue(&self, payload: JobPayload) -> ServiceResult<()> {
        let job = JobData {
            job_id: Uuid::now_v7().to_string(),
            attempts: 0,
            max_retries: self.max_retries,
            payload,
        };
        tracing::debug!(
            queue = self.name,
            job_id = %job.job_id,
            kind = job.payload.kind(),
            "job enqueued"
        );
        self.pending.lock().await.push_back(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_payload(to: &str) -> JobPayload {
        JobPayload::VerifyEmail {
            to: to.to_string(),
            user_name: "alice".to_string(),
            verification_link: "http://localhost:3000/verify-email?token=t&uid=u".to_string(),
            year: 2026,
        }
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_are_fifo() {
        let queue = InMemoryJobQueue::new("mailer", 3);
        queue.enqueue(verify_payload("first@test.io")).await.unwrap();
        queue.enqueue(verify_payload("second@test.io")).await.unwrap();
        assert_eq!(queue.len().await, 2);

        let first = queue.dequeue().await.expect("job");
        assert_eq!(first.attempts, 0);
        assert_eq!(first.max_retries, 3);
        match first.payload {
            JobPayload::VerifyEmail { to, .. } => assert_eq!(to, "first@test.io"),
            other => panic!("unexpected payload: {other:?}"),
        }

        let second = queue.dequeue().await.expect("job");
        match second.payload {
            JobPayload::VerifyEmail { to, .. } => assert_eq!(to, "second@test.io"),
            other => panic!("unexpected payload: {other:?}"),
        }

        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn requeue_increments_attempts() {
        let queue = InMemoryJobQueue::new("mailer", 3);
        queue.enqueue(verify_payload("a@test.io")).await.unwrap();
        let job = queue.dequeue().await.unwrap();
        queue.requeue(job).await;
        let job = queue.dequeue().await.unwrap();
        assert_eq!(job.attempts, 1);
    }

    #[test]
    fn payloads_serialize_with_kind_tags() {
        let json = serde_json::to_value(verify_payload("a@test.io")).unwrap();
        assert_eq!(json["kind"], "verify-email");

        let json = serde_json::to_value(JobPayload::ResetPasswordEmail {
            to: "a@test.io".to_string(),
            name: "Alice".to_string(),
            reset_url: "http://localhost/reset".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "reset-password-email");

        let json = serde_json::to_value(JobPayload::UploadImage {
            buffer: "aGVsbG8=".to_string(),
            mime_type: "image/png".to_string(),
            bucket_name: "uploads".to_string(),
            key: "123-abc.png".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "upload-image");
    }
}
