//! Keyed LSB steganography for RGB(A) images, plus the statistical tests
//! used to judge how detectable it is.
//!
//! - [`processing`]: bit codec, pixel orders, embedding and extraction
//! - [`analysis`]: balance test, pairs-of-values test, bit-plane views

pub mod analysis;
pub mod common;
pub mod processing;

pub use common::{Result, StegoError};
