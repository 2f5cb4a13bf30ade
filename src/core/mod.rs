//! Core application layer
//!
//! This module provides:
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system
//! - Clock abstraction for time-bounded tokens

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AppError, ErrorResponse, Result};
pub use logging::Logger;
