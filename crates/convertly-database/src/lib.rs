//! # convertly-database
//!
//! Durable persistence for job records. Defines the [`JobStore`]
//! contract the dispatcher and status endpoint share, with a
//! PostgreSQL implementation for production and an in-memory
//! implementation for tests and single-process development.

pub mod connection;
pub mod job_store;
pub mod migration;

pub use job_store::memory::MemoryJobStore;
pub use job_store::pg::PgJobStore;
pub use job_store::JobStore;
