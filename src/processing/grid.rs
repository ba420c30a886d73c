//! # Pixel Grids and Image I/O
//!
//! [`PixelGrid`] is the in-memory raster every codec and detector works on:
//! row-major, 3 (RGB) or 4 (RGBA) `u8` channels per pixel. [`Plane`] is its
//! single-channel sibling, used for luma and bit-plane images.
//!
//! The file boundary lives here too. Decoding goes through the `image` crate
//! and encoding is restricted to lossless formats, because any lossy
//! re-encode would wipe the LSB layer.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::common::error::{Result, StegoError};

/// A colour channel that can carry payload bits. Alpha is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All colour channels in their natural order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Offset of this channel inside a pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Colour layout requested when decoding a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// RGBA if the source has an alpha channel, RGB otherwise
    #[default]
    Preserve,
    Rgb,
    Rgba,
}

/// Row-major RGB(A) raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wraps a raw interleaved buffer.
    ///
    /// # Errors
    /// [`StegoError::InvalidGrid`] if `channels` is not 3 or 4, or if the
    /// buffer length is not `width * height * channels`.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(StegoError::InvalidGrid(format!(
                "expected 3 or 4 channels, got {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(StegoError::InvalidGrid(format!(
                "{}x{}x{} grid needs {} bytes, got {}",
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Converts a decoded image into a grid with the requested layout.
    pub fn from_image(image: &DynamicImage, mode: ColorMode) -> Self {
        let keep_alpha = match mode {
            ColorMode::Preserve => image.color().has_alpha(),
            ColorMode::Rgb => false,
            ColorMode::Rgba => true,
        };

        if keep_alpha {
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            Self {
                width,
                height,
                channels: 4,
                data: rgba.into_raw(),
            }
        } else {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Self {
                width,
                height,
                channels: 3,
                data: rgb.into_raw(),
            }
        }
    }

    /// Converts the grid back into an `image` buffer of the same layout.
    pub fn to_image(&self) -> DynamicImage {
        // Buffer length is checked at construction, so from_raw cannot fail here.
        if self.has_alpha() {
            RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgba8)
                .unwrap_or_else(|| DynamicImage::new_rgba8(self.width, self.height))
        } else {
            RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .unwrap_or_else(|| DynamicImage::new_rgb8(self.width, self.height))
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of channels per pixel (3 or 4).
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// `width * height`.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Channels of the pixel at flat row-major `index`.
    pub fn pixel(&self, index: usize) -> &[u8] {
        let start = index * self.channels;
        &self.data[start..start + self.channels]
    }

    pub fn pixel_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.channels;
        &mut self.data[start..start + self.channels]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Iterates over the values of one colour channel in row-major order.
    pub fn channel_values(&self, channel: Channel) -> impl Iterator<Item = u8> + '_ {
        self.data
            .chunks_exact(self.channels)
            .map(move |px| px[channel.index()])
    }

    /// Builds a plane of the same geometry by mapping one channel's values.
    pub fn channel_plane(&self, channel: Channel, f: impl Fn(u8) -> u8) -> Plane {
        Plane {
            width: self.width,
            height: self.height,
            data: self.channel_values(channel).map(f).collect(),
        }
    }

    /// Luma plane using ITU-R 601-2 weights in 16-bit fixed point.
    pub fn to_luma(&self) -> Plane {
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16) as u8
            })
            .collect();
        Plane {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Single-channel row-major raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Plane {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(StegoError::InvalidGrid(format!(
                "{}x{} plane needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Frequency of each of the 256 intensity values.
    pub fn histogram(&self) -> [u64; 256] {
        let mut frequencies = [0u64; 256];
        for &value in &self.data {
            frequencies[value as usize] += 1;
        }
        frequencies
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

// ============================================================================
// FILE BOUNDARY
// ============================================================================

/// Decodes an image file into a grid.
///
/// # Arguments
/// - `path`: Image file in any format the `image` crate can read
/// - `mode`: Requested colour layout
///
/// # Errors
/// [`StegoError::SourceUnavailable`] if the file is missing or cannot be decoded.
pub fn load_grid(path: &Path, mode: ColorMode) -> Result<PixelGrid> {
    let image = image::open(path).map_err(|source| StegoError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = PixelGrid::from_image(&image, mode);
    debug!(
        "Loaded {} ({}x{}, {} channels)",
        path.display(),
        grid.width(),
        grid.height(),
        grid.channels()
    );
    Ok(grid)
}

/// Returns the output format for `path`, refusing anything lossy.
pub fn lossless_format(path: &Path) -> Result<ImageFormat> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Tiff)) => Ok(format),
        _ => Err(StegoError::LossyFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Encodes a grid to a lossless file.
///
/// The format check runs before anything is written, so a rejected path
/// leaves no partial output behind.
pub fn save_grid(grid: &PixelGrid, path: &Path) -> Result<()> {
    let format = lossless_format(path)?;
    grid.to_image()
        .save_with_format(path, format)
        .map_err(|source| StegoError::SinkUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {} as {:?}", path.display(), format);
    Ok(())
}

/// Encodes a single-channel plane to a lossless file.
pub fn save_plane(plane: &Plane, path: &Path) -> Result<()> {
    let format = lossless_format(path)?;
    plane
        .to_image()
        .save_with_format(path, format)
        .map_err(|source| StegoError::SinkUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {} as {:?}", path.display(), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(matches!(
            PixelGrid::new(2, 2, 3, vec![0; 11]),
            Err(StegoError::InvalidGrid(_))
        ));
        assert!(matches!(
            PixelGrid::new(2, 2, 2, vec![0; 8]),
            Err(StegoError::InvalidGrid(_))
        ));
    }

    #[test]
    fn luma_of_gray_pixel_is_identity() {
        let data: Vec<u8> = (0..=255u8).flat_map(|v| [v, v, v]).collect();
        let grid = PixelGrid::new(256, 1, 3, data).unwrap();
        let luma = grid.to_luma();
        let expected: Vec<u8> = (0..=255u8).collect();
        assert_eq!(luma.as_raw(), expected.as_slice());
    }

    #[test]
    fn luma_weights_favour_green() {
        let grid = PixelGrid::new(3, 1, 3, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
        assert_eq!(grid.to_luma().as_raw(), &[76, 150, 29]);
    }

    #[test]
    fn histogram_counts_every_pixel() {
        let plane = Plane::new(4, 1, vec![0, 0, 7, 255]).unwrap();
        let hist = plane.histogram();
        assert_eq!(hist[0], 2);
        assert_eq!(hist[7], 1);
        assert_eq!(hist[255], 1);
        assert_eq!(hist.iter().sum::<u64>(), 4);
    }

    #[test]
    fn image_conversion_keeps_alpha_only_when_asked() {
        let rgba = RgbaImage::from_raw(1, 1, vec![10, 20, 30, 40]).unwrap();
        let image = DynamicImage::ImageRgba8(rgba);

        let kept = PixelGrid::from_image(&image, ColorMode::Preserve);
        assert_eq!(kept.as_raw(), &[10, 20, 30, 40]);

        let dropped = PixelGrid::from_image(&image, ColorMode::Rgb);
        assert_eq!(dropped.as_raw(), &[10, 20, 30]);
    }

    #[test]
    fn lossy_extensions_are_refused() {
        assert!(lossless_format(Path::new("out.png")).is_ok());
        assert!(lossless_format(Path::new("out.bmp")).is_ok());
        assert!(matches!(
            lossless_format(Path::new("out.jpg")),
            Err(StegoError::LossyFormat { .. })
        ));
        assert!(matches!(
            lossless_format(Path::new("out")),
            Err(StegoError::LossyFormat { .. })
        ));
    }
}
