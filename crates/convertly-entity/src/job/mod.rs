//! Conversion job domain entities.

pub mod family;
pub mod model;
pub mod payload;
pub mod status;

pub use family::JobFamily;
pub use model::{Job, JobOutput, SubmitReceipt};
pub use payload::{DocumentPayload, ImagePayload, JobPayload};
pub use status::JobStatus;
