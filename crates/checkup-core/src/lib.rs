//! # Checkup Core
//!
//! Core types and error handling for the checkup health engine.
//!
//! This crate provides the foundational pieces shared by the engine, the
//! instruction loader and the CLI:
//! - The [`Error`] taxonomy and [`Result`] alias
//! - Check parameters and structured check failures

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{CheckFailure, Parameters, ParametersExt};
}
