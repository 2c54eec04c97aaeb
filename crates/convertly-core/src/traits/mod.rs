//! Trait seams between the job execution core and its collaborators.

pub mod storage;

pub use storage::ObjectStore;
