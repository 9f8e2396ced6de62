//! # Core Runtime Module
//!
//! Provides the ambient runtime infrastructure shared by the sync crates:
//! - Logging and tracing infrastructure
//! - Runtime error type
//!
//! ## Overview
//!
//! The engine crates only emit `tracing` events and spans. Hosts call
//! [`logging::init_logging`] once at startup to decide where those events go
//! and how they are formatted.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
