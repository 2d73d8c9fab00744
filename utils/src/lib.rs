//! Shared utilities for the custody wallet backend.

pub mod logging;
pub mod spans;

pub use logging::{init_logging, LogFormat};
