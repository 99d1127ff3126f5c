//! Work dispatcher: sequence assignment, job construction and execution,
//! and reduction to an [`Outcome`].
//!
//! One dispatch moves through
//! `Received -> Parsed -> Dispatched -> {Succeeded | Failed} -> Responded`;
//! this module owns the `Dispatched` step and never lets an error escape.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use ingest_core::error::JobError;
use ingest_core::sequence::SequenceCounter;
use ingest_core::types::SequenceNumber;
use ingest_jobs::{ExecutionContext, JobFactory};
use ingest_stores::{DocumentStore, Warehouse};
use tokio_util::sync::CancellationToken;

use crate::ack::{self, OutcomeKind};
use crate::error::{AppError, AppResult};

/// Which half of the job contract failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Process,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Create => f.write_str("create"),
            Stage::Process => f.write_str("process"),
        }
    }
}

/// Result of dispatching one payload.
#[derive(Debug)]
pub enum Outcome {
    Succeeded {
        sequence: SequenceNumber,
    },
    Failed {
        sequence: SequenceNumber,
        stage: Stage,
        error: JobError,
    },
}

impl Outcome {
    pub fn sequence(&self) -> SequenceNumber {
        match self {
            Outcome::Succeeded { sequence } | Outcome::Failed { sequence, .. } => *sequence,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Succeeded { .. } => OutcomeKind::Acknowledged,
            Outcome::Failed { error, .. } => OutcomeKind::from_retryability(error.retryability()),
        }
    }

    /// Reduce to a handler result: the acknowledgement status, or an error
    /// whose response carries the failure status.
    pub fn into_result(self) -> AppResult<StatusCode> {
        match self {
            Outcome::Succeeded { .. } => Ok(ack::status_for(OutcomeKind::Acknowledged)),
            Outcome::Failed {
                sequence,
                stage,
                error,
            } => Err(AppError::Job {
                sequence,
                stage,
                source: error,
            }),
        }
    }
}

/// Assigns sequence numbers and drives jobs against the shared stores.
///
/// Shared by every request; the counter is the only mutable state.
pub struct Dispatcher {
    counter: SequenceCounter,
    factory: Arc<dyn JobFactory>,
    warehouse: Arc<dyn Warehouse>,
    documents: Arc<dyn DocumentStore>,
}

impl Dispatcher {
    pub fn new(
        initial_sequence: SequenceNumber,
        factory: Arc<dyn JobFactory>,
        warehouse: Arc<dyn Warehouse>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            counter: SequenceCounter::new(initial_sequence),
            factory,
            warehouse,
            documents,
        }
    }

    /// The most recently assigned sequence number.
    pub fn last_sequence(&self) -> SequenceNumber {
        self.counter.current()
    }

    /// Create and process a job for `payload`.
    ///
    /// `cancel` must be fresh for this delivery. No deadline is applied here.
    pub async fn dispatch(&self, payload: Vec<u8>, cancel: CancellationToken) -> Outcome {
        let sequence = self.counter.next();

        let job = match self
            .factory
            .create(
                payload,
                sequence,
                Arc::clone(&self.warehouse),
                Arc::clone(&self.documents),
            )
            .await
        {
            Ok(job) => job,
            Err(error) => return failed(sequence, Stage::Create, error),
        };

        let ctx = ExecutionContext::new(sequence, cancel);
        match job.process(&ctx).await {
            Ok(()) => {
                tracing::info!(sequence, "Job done, acknowledging delivery");
                Outcome::Succeeded { sequence }
            }
            Err(error) => failed(sequence, Stage::Process, error),
        }
    }
}

fn failed(sequence: SequenceNumber, stage: Stage, error: JobError) -> Outcome {
    let retryability = error.retryability();
    if retryability.is_retryable() {
        tracing::error!(sequence, %stage, code = error.code(), error = %error, "Job failed, delivery will be retried");
    } else {
        tracing::warn!(sequence, %stage, code = error.code(), error = %error, "Job failed permanently, delivery will not be retried");
    }
    Outcome::Failed {
        sequence,
        stage,
        error,
    }
}
