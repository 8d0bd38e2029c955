//! Centralized error handling for the forum store
//!
//! # Error Categories
//!
//! - **Repository Errors**: data access failures, missing records, rejected input
//! - **Application Errors**: configuration, I/O and startup failures
//!
//! # Usage
//!
//! ```rust
//! use forum_store::errors::{RepositoryError, RepositoryResult};
//!
//! fn check(name: &str) -> RepositoryResult<()> {
//!     RepositoryError::require_name("name", name)
//! }
//! # assert!(check("General").is_ok());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;
