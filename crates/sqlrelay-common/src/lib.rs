//! sqlrelay Common Types
//!
//! This crate provides the shared building blocks for the sqlrelay
//! gate and router services:
//!
//! - [`protocol`] - Wire types for the `/query` endpoints
//! - [`classify`] - The destructive-query denylist and read/write classifier
//! - [`auth`] - Shared-secret API key authentication
//!
//! Both services accept and return JSON over HTTP; the types here define
//! that contract in one place so the gate can relay router responses
//! without re-interpreting them.

pub mod auth;
pub mod classify;
pub mod protocol;

pub use classify::{classify, Classification};
pub use protocol::{ErrorBody, QueryRequest, QueryResponse, Strategy, DEFAULT_STRATEGY};

use thiserror::Error;

/// Errors shared across the sqlrelay services.
///
/// Request-level outcomes (401/400/403/500 bodies) are expressed directly
/// as HTTP responses by the handlers; this enum covers the infrastructure
/// failures underneath them.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Query failed on node {node}: {message}")]
    Execution { node: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
