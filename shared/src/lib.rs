//! Shared types for the commerce platform
//!
//! Error catalogue, response envelope, domain models and small utilities
//! used by the API server and its clients.

pub mod correlation;
pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
