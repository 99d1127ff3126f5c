//! Units of work derived from delivered messages.
//!
//! [`JobFactory::create`] turns a raw payload into a [`Job`];
//! [`Job::process`] drives it to completion against the two stores. Both
//! report failures as [`JobError`](ingest_core::error::JobError), whose
//! retryability decides whether the message is redelivered.

pub mod event;
pub mod event_job;
pub mod job;

pub use event::IngestEvent;
pub use event_job::{EventJob, EventJobFactory, STATE_COLLECTION};
pub use job::{ExecutionContext, Job, JobFactory};
