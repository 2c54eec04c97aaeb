//! # convertly-entity
//!
//! Domain entities for Convertly: the job record, its status state
//! machine, and the typed conversion payloads.

pub mod job;

pub use job::family::JobFamily;
pub use job::model::{Job, JobOutput, SubmitReceipt};
pub use job::payload::{DocumentPayload, ImagePayload, JobPayload};
pub use job::status::JobStatus;
