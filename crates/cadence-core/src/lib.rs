//! `cadence-core`: configuration and process-level error types shared by the
//! gateway binary.

pub mod config;
pub mod error;

pub use config::CadenceConfig;
pub use error::{CadenceError, Result};
