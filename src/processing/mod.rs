//! # Image Processing and Steganography
//!
//! The keyed LSB codec: pixel grids, the bit codec, pixel visitation orders,
//! and the embed/extract passes built on them.

pub mod bits;
pub mod grid;
pub mod order;
pub mod steganography;

// Re-export main functions for convenience
pub use bits::{BitStream, TERMINATOR};
pub use grid::{load_grid, save_grid, save_plane, Channel, ColorMode, PixelGrid, Plane};
pub use order::PixelOrder;
pub use steganography::{
    capacity, embed, embed_at_ratio, embed_text, extract, extract_text, fill_text, sweep,
    sweep_payload, sweep_repeats, ChannelOrder, EmbedPolicy,
};
