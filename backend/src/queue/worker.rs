//! Worker pools that drain the job queues.
//!
//! Each pool owns a fixed number of workers polling one queue. A worker
//! executes jobs through a [`JobRunner`]; failures are requeued until the
//! job's attempt budget is exhausted, then dropped with an error log.

use crate::errors::{ServiceError, ServiceResult};
use crate::queue::{InMemoryJobQueue, JobPayload};
use crate::services::email_service::EmailService;
use crate::storage::StorageClient;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

/// Executes one job payload.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, payload: &JobPayload) -> ServiceResult<()>;
}

/// Production runner: mail jobs go out over SMTP, upload jobs to object
/// storage. Either collaborator may be absent when unconfigured; its jobs
/// then fail and are retried/dropped by the worker.
pub struct SideEffectRunner {
    email: Option<EmailService>,
    storage: Option<Arc<dyn StorageClient>>,
}

impl SideEffectRunner {
    pub fn new(email: Option<EmailService>, storage: Option<Arc<dyn StorageClient>>) -> Self {
        Self { email, storage }
    }
}

#[async_trait]
impl JobRunner for SideEffectRunner {
    async fn run(&self, payload: &JobPayload) -> ServiceResult<()> {
        match payload {
            JobPayload::VerifyEmail {
                to,
                user_name,
                verification_link,
                year,
            } => {
                let email = self
                    .email
                    .as_ref()
                    .ok_or_else(|| ServiceError::internal_error("email service not configured"))?;
                email
                    .send_account_verify_email(to, user_name, verification_link, *year)
                    .await
            }
            JobPayload::ResetPasswordEmail { to, name, reset_url } => {
                let email = self
                    .email
                    .as_ref()
                    .ok_or_else(|| ServiceError::internal_error("email service not configured"))?;
                email.send_password_reset_email(to, name, reset_url).await
            }
            JobPayload::UploadImage {
                buffer,
                mime_type,
                bucket_name,
                key,
            } => {
                let storage = self
                    .storage
                    .as_ref()
                    .ok_or_else(|| ServiceError::internal_error("storage client not configured"))?;
                let bytes = general_purpose::STANDARD
                    .decode(buffer)
                    .map_err(|e| ServiceError::validation(format!("invalid upload buffer: {e}")))?;
                storage
                    .put_object(bucket_name, key, Bytes::from(bytes), mime_type)
                    .await
            }
        }
    }
}

/// A single worker that processes jobs from a queue.
struct JobWorker {
    queue: Arc<InMemoryJobQueue>,
    runner: Arc<dyn JobRunner>,
    worker_id: String,
}

impl JobWorker {
    /// Runs until shutdown is requested via the shutdown channel.
    async fn start(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(worker_id = %self.worker_id, "job worker started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!(worker_id = %self.worker_id, "shutdown signal received");
                    break;
                }
                processed = self.process_next_job() => {
                    if !processed {
                        // No job available, wait a bit before polling again
                        tokio::select! {
                            _ = shutdown_rx.recv() => break,
                            _ = sleep(Duration::from_millis(100)) => {},
                        }
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "job worker stopped");
    }

    /// Processes the next available job; returns false when the queue is idle.
    async fn process_next_job(&self) -> bool {
        let Some(job) = self.queue.dequeue().await else {
            return false;
        };

        tracing::debug!(
            worker_id = %self.worker_id,
            job_id = %job.job_id,
            kind = job.payload.kind(),
            attempt = job.attempts + 1,
            "processing job"
        );

        match self.runner.run(&job.payload).await {
            Ok(()) => {
                tracing::info!(
                    worker_id = %self.worker_id,
                    job_id = %job.job_id,
                    kind = job.payload.kind(),
                    "job completed"
                );
            }
            Err(e) if job.attempts < job.max_retries => {
                tracing::warn!(
                    worker_id = %self.worker_id,
                    job_id = %job.job_id,
                    kind = job.payload.kind(),
                    error = %e,
                    "job failed, requeueing"
                );
                self.queue.requeue(job).await;
            }
            Err(e) => {
                tracing::error!(
                    worker_id = %self.worker_id,
                    job_id = %job.job_id,
                    kind = job.payload.kind(),
                    error = %e,
                    "job dropped after exhausting retries"
                );
            }
        }

        true
    }
}

/// Pool of workers that process jobs concurrently.
pub struct WorkerPool {
    workers: Vec<tokio::task::JoinHandle<()>>,
    shutdown_txs: Vec<mpsc::Sender<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers draining `queue`.
    pub fn start(
        queue: Arc<InMemoryJobQueue>,
        runner: Arc<dyn JobRunner>,
        worker_count: usize,
    ) -> Self {
        let mut workers = Vec::new();
        let mut shutdown_txs = Vec::new();

        for i in 0..worker_count {
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
            let worker = JobWorker {
                queue: queue.clone(),
                runner: runner.clone(),
                worker_id: format!("{}-worker-{}", queue.name(), i),
            };

            let handle = tokio::spawn(async move {
                worker.start(shutdown_rx).await;
            });

            workers.push(handle);
            shutdown_txs.push(shutdown_tx);
        }

        Self {
            workers,
            shutdown_txs,
        }
    }

    /// Shuts down all workers gracefully, letting each finish its current job.
    pub async fn shutdown(self) {
        for shutdown_tx in self.shutdown_txs {
            let _ = shutdown_tx.send(()).await;
        }

        futures::future::join_all(self.workers).await;

        tracing::info!("worker pool shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Runner that fails the first `fail_first` calls, then succeeds.
    struct FlakyRunner {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl JobRunner for FlakyRunner {
        async fn run(&self, _payload: &JobPayload) -> ServiceResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(ServiceError::internal_error("transient failure"))
            } else {
                Ok(())
            }
        }
    }

    fn upload_payload() -> JobPayload {
        JobPayload::UploadImage {
            buffer: general_purpose::STANDARD.encode(b"fake image bytes"),
            mime_type: "image/png".to_string(),
            bucket_name: "uploads".to_string(),
            key: "k.png".to_string(),
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn worker_retries_until_success() {
        use crate::queue::JobDispatcher;

        let queue = Arc::new(InMemoryJobQueue::new("uploader", 3));
        let runner = Arc::new(FlakyRunner {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let pool = WorkerPool::start(queue.clone(), runner.clone(), 1);

        queue.enqueue(upload_payload()).await.unwrap();

        wait_for(|| runner.calls.load(Ordering::SeqCst) >= 3).await;
        pool.shutdown().await;

        assert_eq!(runner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn worker_drops_job_after_exhausting_retries() {
        use crate::queue::JobDispatcher;

        let queue = Arc::new(InMemoryJobQueue::new("uploader", 2));
        let runner = Arc::new(FlakyRunner {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });
        let pool = WorkerPool::start(queue.clone(), runner.clone(), 1);

        queue.enqueue(upload_payload()).await.unwrap();

        // 1 initial attempt + 2 retries, then the job is dropped.
        wait_for(|| runner.calls.load(Ordering::SeqCst) >= 3).await;
        pool.shutdown().await;

        assert_eq!(runner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn unconfigured_runner_rejects_mail_jobs() {
        let runner = SideEffectRunner::new(None, None);
        let err = runner
            .run(&JobPayload::ResetPasswordEmail {
                to: "a@test.io".to_string(),
                name: "Alice".to_string(),
                reset_url: "http://localhost/reset".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InternalError { .. }));
    }
}
