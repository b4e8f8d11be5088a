//! # Mirage Utilities
//!
//! Shared helpers for the mirage workspace.
//!
//! At the moment this is the logging setup: a `tracing` subscriber that keeps
//! standard output free for protocol traffic.

pub mod logging;

pub use logging::{
    default_log_file, init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LoggingError,
    LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
