//! # convertly-storage
//!
//! Object storage backends for Convertly. Transformation functions
//! stage their input/output through the [`ObjectStore`] seam defined in
//! `convertly-core`; this crate ships a local-filesystem provider for
//! single-node deployments and an in-memory provider for tests.
//!
//! [`ObjectStore`]: convertly_core::traits::ObjectStore

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
