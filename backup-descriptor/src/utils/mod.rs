//! Utility modules for the descriptor crate.

pub mod errors;
pub mod logger;

pub use errors::{DescriptorError, Result};
