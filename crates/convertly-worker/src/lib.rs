//! # convertly-worker
//!
//! The asynchronous job execution core:
//! - [`JobDispatcher`] turns a submission into an immediately-returned
//!   job handle and drives execution in the background
//! - [`WorkerPool`] executes one family's jobs with bounded concurrency
//!   and a bounded backlog
//! - [`transform`] holds the transformation functions the pools dispatch
//!   to by task

pub mod dispatcher;
pub mod pool;
pub mod transform;

pub use dispatcher::JobDispatcher;
pub use pool::WorkerPool;
pub use transform::Transformer;
