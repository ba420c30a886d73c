//! # Common Components
//!
//! Shared utilities used by the library and both binaries.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with defaults
//! - [`error`]: the library error type
//! - [`logging`]: `env_logger` setup for the binaries

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Result, StegoError};
