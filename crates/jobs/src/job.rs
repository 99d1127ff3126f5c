use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use ingest_core::error::JobError;
use ingest_core::types::SequenceNumber;
use ingest_stores::{DocumentStore, Warehouse};
use tokio_util::sync::CancellationToken;

/// Per-delivery execution context handed to [`Job::process`].
///
/// Created fresh for every request and never shared between requests. No
/// deadline is attached here; cancellation comes from the request being
/// dropped upstream.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    sequence: SequenceNumber,
    cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(sequence: SequenceNumber, cancel: CancellationToken) -> Self {
        Self { sequence, cancel }
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` to completion unless the context is cancelled first.
    ///
    /// Cancellation wins ties and yields [`JobError::Cancelled`]; the
    /// in-flight future is dropped.
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T, JobError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<JobError>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(JobError::Cancelled),
            result = fut => result.map_err(Into::into),
        }
    }
}

/// A constructed unit of work.
#[async_trait]
pub trait Job: Send + Sync {
    async fn process(&self, ctx: &ExecutionContext) -> Result<(), JobError>;
}

/// Builds a [`Job`] from a raw message payload.
#[async_trait]
pub trait JobFactory: Send + Sync {
    async fn create(
        &self,
        payload: Vec<u8>,
        sequence: SequenceNumber,
        warehouse: Arc<dyn Warehouse>,
        documents: Arc<dyn DocumentStore>,
    ) -> Result<Box<dyn Job>, JobError>;
}
