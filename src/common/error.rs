//! # Error Types
//!
//! Every fallible operation in the library returns [`StegoError`]. Binaries
//! wrap it in `anyhow` at the top level.
//!
//! None of these errors is retried anywhere: all operations are
//! deterministic, so repeating a call with the same inputs reproduces the
//! same failure.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the codec, the image I/O layer and the detectors.
#[derive(Error, Debug)]
pub enum StegoError {
    /// A payload character does not fit the 8-bit encoding.
    #[error("character {ch:?} (U+{code:04X}) at position {position} does not fit in 8 bits")]
    Encoding { ch: char, code: u32, position: usize },

    /// The bit stream is longer than the grid can hold under the truncate policy.
    #[error("payload too large: need {needed} bits but only {capacity} bits are available")]
    Capacity { needed: usize, capacity: usize },

    /// The terminator was never found while decoding.
    #[error("no terminator found after reading {bits_read} bits (wrong password or no payload)")]
    Truncation { bits_read: usize },

    /// The source image could not be opened or decoded.
    #[error("cannot read image {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output image could not be encoded or written.
    #[error("cannot write image {path}: {source}")]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output path names a format that would destroy LSB data.
    #[error("refusing to write {path}: only lossless formats (png, bmp, tiff) keep LSB data")]
    LossyFormat { path: PathBuf },

    /// A pixel order was built for a different pixel count than the grid has.
    #[error("pixel order covers {actual} pixels but the grid has {expected}")]
    OrderMismatch { expected: usize, actual: usize },

    /// The wrap policy was asked to cycle an empty bit stream.
    #[error("cannot wrap an empty bit stream")]
    EmptyStream,

    /// A sweep ratio is zero, negative, or not a finite number.
    #[error("sweep ratio must be a positive finite number, got {0}")]
    InvalidRatio(f64),

    /// Channel order is empty or names a channel twice.
    #[error("invalid channel order: {0}")]
    InvalidChannels(String),

    /// Raw pixel buffer does not match the declared geometry.
    #[error("invalid pixel grid: {0}")]
    InvalidGrid(String),

    /// Configuration file could not be read or holds invalid values.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, StegoError>;
