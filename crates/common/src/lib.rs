//! Shared error definitions and small helpers used across all docpilot crates.

pub mod cell;
pub mod error;
pub mod json;

pub use error::{Error, FromMessage, Result};
