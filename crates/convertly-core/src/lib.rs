//! # convertly-core
//!
//! Core crate for Convertly. Contains configuration schemas, typed
//! identifiers, the object storage trait seam, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Convertly crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
