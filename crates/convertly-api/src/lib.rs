//! # convertly-api
//!
//! HTTP API layer for Convertly built on Axum.
//!
//! Provides the job submission and status endpoints, the signed file
//! download endpoint, health checks, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
