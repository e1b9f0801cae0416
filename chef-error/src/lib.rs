//! # chef-error
//!
//! Unified error handling for the Adaptive Chef workspace.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g., InferenceFailed, RateLimited)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Key-value pairs that help locate the cause
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use chef_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::EmptyResponse, "critic returned no text")
//!         .with_operation("refinement::critique")
//!         .with_context("iteration", "2"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Library functions return `Result<T, chef_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, callers only append context
//! - Conversions from other error types are explicit

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the chef Error
pub type Result<T> = std::result::Result<T, Error>;
