//! # LSB Steganography Implementation
//!
//! Hides a bit stream in the least significant bits of an image's colour
//! channels and reads it back.
//!
//! ## Algorithm
//!
//! ### Encoding Process
//! 1. Encode the text with the [bit codec](super::bits): 8 bits per
//!    character followed by the `##` terminator
//! 2. Visit pixels in the chosen [`PixelOrder`] (row-major or password-keyed)
//! 3. For each visited pixel, write the next bits into its channels in
//!    [`ChannelOrder`] (R → G → B by default):
//!    - Clear the LSB of the channel
//!    - Set the LSB to the data bit
//! 4. Stop once every bit is written ([`EmbedPolicy::Truncate`]) or once
//!    every channel of every pixel is written ([`EmbedPolicy::Wrap`])
//!
//! ### Decoding Process
//! 1. Visit pixels in the same order and read the same channels
//! 2. Reassemble characters every 8 bits
//! 3. Stop at the terminator, or fail if the image runs out first
//!
//! ### Capacity
//! An image holds `width * height * C` bits, where `C` is the number of
//! channels in the channel order (3 for RGB). The alpha channel is never
//! touched.
//!
//! ### Wrap policy
//! Wrap treats the stream as circular and keeps writing until the image is
//! full. Repetition erases the payload boundary, so a wrap-filled image has
//! no defined extraction. It exists to generate steganalysis inputs at a
//! known embedding density.

use log::debug;
use serde::{Deserialize, Serialize};

use super::bits::{self, BitStream, TextDecoder};
use super::grid::{Channel, PixelGrid};
use super::order::PixelOrder;
use crate::common::error::{Result, StegoError};

/// What happens when the stream and the image capacity differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedPolicy {
    /// Write the stream once; fail if it does not fit
    #[default]
    Truncate,
    /// Repeat the stream until every slot in the image is written
    Wrap,
}

/// Channels written per pixel, in order. Never empty, never repeats a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOrder {
    channels: Vec<Channel>,
}

impl ChannelOrder {
    /// Validates a channel order.
    ///
    /// # Errors
    /// [`StegoError::InvalidChannels`] if the list is empty or repeats a channel.
    pub fn new(channels: Vec<Channel>) -> Result<Self> {
        if channels.is_empty() {
            return Err(StegoError::InvalidChannels(
                "at least one channel is required".to_string(),
            ));
        }
        for (i, channel) in channels.iter().enumerate() {
            if channels[..i].contains(channel) {
                return Err(StegoError::InvalidChannels(format!(
                    "{} listed more than once",
                    channel
                )));
            }
        }
        Ok(Self { channels })
    }

    /// Red, then green, then blue.
    pub fn rgb() -> Self {
        Self {
            channels: Channel::ALL.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn as_slice(&self) -> &[Channel] {
        &self.channels
    }
}

impl Default for ChannelOrder {
    fn default() -> Self {
        Self::rgb()
    }
}

/// Number of payload bits `grid` can carry with the given channels.
pub fn capacity(grid: &PixelGrid, channels: &ChannelOrder) -> usize {
    grid.pixel_count() * channels.len()
}

fn check_order(grid: &PixelGrid, order: &PixelOrder) -> Result<()> {
    if order.len() != grid.pixel_count() {
        return Err(StegoError::OrderMismatch {
            expected: grid.pixel_count(),
            actual: order.len(),
        });
    }
    Ok(())
}

/// Embeds a bit stream into a copy of `grid`.
///
/// # Arguments
/// - `grid`: Cover image; left untouched
/// - `stream`: Bits to hide
/// - `order`: Pixel visitation order; must cover exactly `grid.pixel_count()` pixels
/// - `policy`: Truncate (fail on overflow) or wrap (fill the whole image)
/// - `channels`: Channels written per pixel, in order
///
/// # Returns
/// - `Ok(PixelGrid)`: A new grid that differs from `grid` only in the LSBs
///   of the listed channels
///
/// # Errors
/// - [`StegoError::OrderMismatch`] if the order was built for another size
/// - [`StegoError::Capacity`] if the stream does not fit under truncate
/// - [`StegoError::EmptyStream`] if wrap is asked to cycle nothing
pub fn embed(
    grid: &PixelGrid,
    stream: &BitStream,
    order: &PixelOrder,
    policy: EmbedPolicy,
    channels: &ChannelOrder,
) -> Result<PixelGrid> {
    check_order(grid, order)?;

    let available = capacity(grid, channels);
    let slots = match policy {
        EmbedPolicy::Truncate => {
            if stream.len() > available {
                return Err(StegoError::Capacity {
                    needed: stream.len(),
                    capacity: available,
                });
            }
            stream.len()
        }
        EmbedPolicy::Wrap => {
            if stream.is_empty() {
                return Err(StegoError::EmptyStream);
            }
            available
        }
    };

    debug!(
        "Embedding {} bits ({} slots, {:.2}% of capacity) with {:?} policy",
        stream.len(),
        slots,
        if available == 0 {
            0.0
        } else {
            slots as f64 * 100.0 / available as f64
        },
        policy
    );

    let bits = stream.as_slice();
    let mut output = grid.clone();
    let mut slot = 0;

    'outer: for pixel_index in order.iter() {
        let pixel = output.pixel_mut(pixel_index);
        for channel in channels.as_slice() {
            if slot >= slots {
                break 'outer;
            }
            let bit = bits[slot % bits.len()];
            let value = &mut pixel[channel.index()];
            *value = (*value & !1) | bit;
            slot += 1;
        }
    }

    Ok(output)
}

/// Reads a payload back out of `grid`.
///
/// # Arguments
/// - `grid`: Image produced by [`embed`] with [`EmbedPolicy::Truncate`]
/// - `order`: Same order used at embedding time
/// - `channels`: Same channel order used at embedding time
///
/// # Errors
/// - [`StegoError::OrderMismatch`] if the order was built for another size
/// - [`StegoError::Truncation`] if the terminator never appears, which
///   happens with a wrong password or an image that carries no payload
pub fn extract(grid: &PixelGrid, order: &PixelOrder, channels: &ChannelOrder) -> Result<String> {
    check_order(grid, order)?;

    let mut decoder = TextDecoder::new();
    for pixel_index in order.iter() {
        let pixel = grid.pixel(pixel_index);
        for channel in channels.as_slice() {
            if let Some(payload) = decoder.push(pixel[channel.index()] & 1) {
                debug!(
                    "Terminator found after {} bits ({} characters)",
                    decoder.bits_read(),
                    payload.chars().count()
                );
                return Ok(payload);
            }
        }
    }

    Err(StegoError::Truncation {
        bits_read: decoder.bits_read(),
    })
}

// ============================================================================
// TEXT-LEVEL HELPERS
// ============================================================================

/// Hides `text` once, terminated, in sequential or keyed order.
///
/// `password: None` selects the sequential order.
pub fn embed_text(
    grid: &PixelGrid,
    text: &str,
    password: Option<&str>,
    channels: &ChannelOrder,
) -> Result<PixelGrid> {
    let stream = bits::encode(text)?;
    let order = PixelOrder::for_password(grid.pixel_count(), password);
    embed(grid, &stream, &order, EmbedPolicy::Truncate, channels)
}

/// Fills every slot of the image with `text` repeated, without a terminator.
pub fn fill_text(
    grid: &PixelGrid,
    text: &str,
    password: Option<&str>,
    channels: &ChannelOrder,
) -> Result<PixelGrid> {
    let stream = bits::encode_raw(text)?;
    let order = PixelOrder::for_password(grid.pixel_count(), password);
    embed(grid, &stream, &order, EmbedPolicy::Wrap, channels)
}

/// Extracts text hidden by [`embed_text`] with the same password and channels.
pub fn extract_text(
    grid: &PixelGrid,
    password: Option<&str>,
    channels: &ChannelOrder,
) -> Result<String> {
    let order = PixelOrder::for_password(grid.pixel_count(), password);
    extract(grid, &order, channels)
}

// ============================================================================
// RATIO SWEEP
// ============================================================================

/// Copies of `message` needed to reach `ratio` of `capacity` bits.
///
/// `floor(capacity * ratio / (8 * chars)) + 1`: the extra copy makes the
/// payload land just above the requested ratio.
///
/// # Errors
/// - [`StegoError::EmptyStream`] if `message` is empty
/// - [`StegoError::InvalidRatio`] unless `ratio` is finite and positive
pub fn sweep_repeats(message: &str, ratio: f64, capacity: usize) -> Result<usize> {
    let per_copy = message.chars().count() * bits::CHAR_BITS;
    if per_copy == 0 {
        return Err(StegoError::EmptyStream);
    }
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(StegoError::InvalidRatio(ratio));
    }
    Ok((capacity as f64 * ratio / per_copy as f64) as usize + 1)
}

/// `message` repeated [`sweep_repeats`] times.
pub fn sweep_payload(message: &str, ratio: f64, capacity: usize) -> Result<String> {
    Ok(message.repeat(sweep_repeats(message, ratio, capacity)?))
}

/// Embeds the sweep payload for one ratio, terminated, under the truncate policy.
///
/// # Errors
/// [`StegoError::Capacity`] when the ratio asks for more than the image holds,
/// plus anything [`sweep_repeats`] or [`embed`] reject.
pub fn embed_at_ratio(
    grid: &PixelGrid,
    message: &str,
    ratio: f64,
    order: &PixelOrder,
    channels: &ChannelOrder,
) -> Result<PixelGrid> {
    let payload = sweep_payload(message, ratio, capacity(grid, channels))?;
    let stream = bits::encode(&payload)?;
    embed(grid, &stream, order, EmbedPolicy::Truncate, channels)
}

/// Runs [`embed_at_ratio`] for every ratio with one keyed order.
///
/// Yields each ratio with its own result so the caller decides which
/// failures skip a ratio and which abort the sweep.
pub fn sweep<'a>(
    grid: &'a PixelGrid,
    message: &'a str,
    ratios: &'a [f64],
    password: &str,
    channels: &'a ChannelOrder,
) -> impl Iterator<Item = (f64, Result<PixelGrid>)> + 'a {
    let order = PixelOrder::keyed(grid.pixel_count(), password);
    ratios
        .iter()
        .map(move |&ratio| (ratio, embed_at_ratio(grid, message, ratio, &order, channels)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noisy_grid(width: u32, height: u32, channels: usize, seed: u64) -> PixelGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..width as usize * height as usize * channels)
            .map(|_| rng.gen::<u8>())
            .collect();
        PixelGrid::new(width, height, channels, data).unwrap()
    }

    fn masked(grid: &PixelGrid) -> Vec<u8> {
        grid.as_raw().iter().map(|v| v & !1).collect()
    }

    #[test]
    fn sequential_round_trip() {
        let cover = noisy_grid(16, 16, 3, 1);
        let channels = ChannelOrder::rgb();
        let stego = embed_text(&cover, "hello world", None, &channels).unwrap();
        assert_eq!(extract_text(&stego, None, &channels).unwrap(), "hello world");
    }

    #[test]
    fn keyed_round_trip() {
        let cover = noisy_grid(20, 15, 4, 2);
        let channels = ChannelOrder::rgb();
        let stego = embed_text(&cover, "Le chiffre indechiffrable.", Some("0"), &channels).unwrap();
        assert_eq!(
            extract_text(&stego, Some("0"), &channels).unwrap(),
            "Le chiffre indechiffrable."
        );
    }

    #[test]
    fn custom_channel_order_round_trip() {
        let cover = noisy_grid(12, 12, 3, 3);
        let channels = ChannelOrder::new(vec![Channel::Blue, Channel::Red]).unwrap();
        let stego = embed_text(&cover, "two channels", Some("pw"), &channels).unwrap();
        assert_eq!(
            extract_text(&stego, Some("pw"), &channels).unwrap(),
            "two channels"
        );
        // Green never written.
        for i in 0..stego.pixel_count() {
            assert_eq!(stego.pixel(i)[1], cover.pixel(i)[1]);
        }
    }

    #[test]
    fn writes_rgb_in_pixel_order() {
        let cover = PixelGrid::new(2, 1, 3, vec![255; 6]).unwrap();
        let stream = BitStream::from_bits([0, 1, 0, 0]);
        let stego = embed(
            &cover,
            &stream,
            &PixelOrder::sequential(2),
            EmbedPolicy::Truncate,
            &ChannelOrder::rgb(),
        )
        .unwrap();
        assert_eq!(stego.as_raw(), &[254, 255, 254, 254, 255, 255]);
    }

    #[test]
    fn embedding_leaves_input_and_high_bits_alone() {
        let cover = noisy_grid(10, 10, 4, 4);
        let before = cover.clone();
        let stego = embed_text(&cover, "non-interference", Some("k"), &ChannelOrder::rgb()).unwrap();

        assert_eq!(cover, before);
        assert_eq!(masked(&stego), masked(&cover));
        for i in 0..stego.pixel_count() {
            assert_eq!(stego.pixel(i)[3], cover.pixel(i)[3], "alpha changed at {i}");
        }
    }

    #[test]
    fn capacity_boundary() {
        // 8 pixels * 3 channels = 24 bits = "a" + "##"
        let cover = noisy_grid(4, 2, 3, 5);
        let channels = ChannelOrder::rgb();
        assert_eq!(capacity(&cover, &channels), 24);
        assert!(embed_text(&cover, "a", None, &channels).is_ok());

        let one_over = BitStream::from_bits(vec![1; 25]);
        let err = embed(
            &cover,
            &one_over,
            &PixelOrder::sequential(8),
            EmbedPolicy::Truncate,
            &channels,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StegoError::Capacity {
                needed: 25,
                capacity: 24
            }
        ));
    }

    #[test]
    fn wrap_fills_every_slot() {
        let cover = PixelGrid::new(3, 1, 3, vec![0; 9]).unwrap();
        let stream = BitStream::from_bits([1, 0]);
        let stego = embed(
            &cover,
            &stream,
            &PixelOrder::sequential(3),
            EmbedPolicy::Wrap,
            &ChannelOrder::rgb(),
        )
        .unwrap();
        assert_eq!(stego.as_raw(), &[1, 0, 1, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn wrap_rejects_empty_stream() {
        let cover = noisy_grid(2, 2, 3, 6);
        assert!(matches!(
            fill_text(&cover, "", None, &ChannelOrder::rgb()),
            Err(StegoError::EmptyStream)
        ));
    }

    #[test]
    fn wrap_ignores_capacity_limit() {
        let cover = noisy_grid(2, 2, 3, 7);
        let stego = fill_text(&cover, "far longer than twelve bits", None, &ChannelOrder::rgb());
        assert!(stego.is_ok());
    }

    #[test]
    fn embedding_is_deterministic() {
        let cover = noisy_grid(32, 32, 3, 8);
        let channels = ChannelOrder::rgb();
        let a = embed_text(&cover, "same input", Some("pw"), &channels).unwrap();
        let b = embed_text(&cover, "same input", Some("pw"), &channels).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn clean_image_has_no_payload() {
        let cover = PixelGrid::new(16, 16, 3, vec![128; 16 * 16 * 3]).unwrap();
        let err = extract_text(&cover, None, &ChannelOrder::rgb()).unwrap_err();
        assert!(matches!(err, StegoError::Truncation { bits_read: 768 }));
    }

    #[test]
    fn wrong_password_fails() {
        let cover = PixelGrid::new(32, 32, 3, vec![0; 32 * 32 * 3]).unwrap();
        let channels = ChannelOrder::rgb();
        let stego = embed_text(&cover, "hello world", Some("right"), &channels).unwrap();
        assert!(matches!(
            extract_text(&stego, Some("wrong"), &channels),
            Err(StegoError::Truncation { .. })
        ));
    }

    #[test]
    fn order_size_must_match_grid() {
        let cover = noisy_grid(4, 4, 3, 9);
        let stream = bits::encode("x").unwrap();
        let err = embed(
            &cover,
            &stream,
            &PixelOrder::sequential(15),
            EmbedPolicy::Truncate,
            &ChannelOrder::rgb(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StegoError::OrderMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn channel_order_validation() {
        assert!(ChannelOrder::new(vec![]).is_err());
        assert!(ChannelOrder::new(vec![Channel::Green, Channel::Green]).is_err());
        assert_eq!(ChannelOrder::default().len(), 3);
    }

    fn random_payload(rng: &mut StdRng, max_chars: usize) -> String {
        let len = rng.gen_range(0..=max_chars);
        (0..len)
            .map(|_| loop {
                let byte: u8 = rng.gen();
                if byte != b'#' {
                    break char::from(byte);
                }
            })
            .collect()
    }

    #[test]
    fn random_payloads_round_trip_in_both_orders() {
        let mut rng = StdRng::seed_from_u64(42);
        let channels = ChannelOrder::rgb();
        let mut checked = 0;

        for case in 0..300u64 {
            let width = rng.gen_range(1..=20);
            let height = rng.gen_range(1..=20);
            let depth = if rng.gen_bool(0.5) { 3 } else { 4 };
            let cover = noisy_grid(width, height, depth, 1000 + case);

            let max_chars = capacity(&cover, &channels) / bits::CHAR_BITS;
            if max_chars < 2 {
                continue;
            }
            let payload = random_payload(&mut rng, max_chars - 2);
            let password = format!("pw-{case}");

            for password in [None, Some(password.as_str())] {
                let stego = embed_text(&cover, &payload, password, &channels).unwrap();
                assert_eq!(
                    extract_text(&stego, password, &channels).unwrap(),
                    payload,
                    "{width}x{height}x{depth}, password {password:?}"
                );
            }
            checked += 1;
        }
        assert!(checked > 250);
    }

    #[test]
    fn keyed_exactly_full_capacity() {
        // 8 * 4 pixels * 3 channels = 96 bits = 10 characters + "##"
        let cover = noisy_grid(8, 4, 3, 10);
        let channels = ChannelOrder::rgb();
        let payload = "full house";

        let stego = embed_text(&cover, payload, Some("0"), &channels).unwrap();
        assert_eq!(extract_text(&stego, Some("0"), &channels).unwrap(), payload);

        let err = embed_text(&cover, "full house!", Some("0"), &channels).unwrap_err();
        assert!(matches!(
            err,
            StegoError::Capacity {
                needed: 104,
                capacity: 96
            }
        ));
    }

    #[test]
    fn sweep_repeat_count() {
        // 64 * 0.5 / 32 = 1, plus the extra copy
        assert_eq!(sweep_repeats("abcd", 0.5, 64).unwrap(), 2);
        // 100 * 0.5 / 32 = 1.56, floored
        assert_eq!(sweep_repeats("abcd", 0.5, 100).unwrap(), 2);
        assert_eq!(sweep_repeats("abcd", 0.25, 1024).unwrap(), 9);
        assert_eq!(sweep_payload("ab", 0.25, 256).unwrap(), "ababababab");
    }

    #[test]
    fn sweep_rejects_bad_inputs() {
        for ratio in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sweep_repeats("abc", ratio, 100),
                Err(StegoError::InvalidRatio(_))
            ));
        }
        assert!(matches!(
            sweep_repeats("", 0.5, 100),
            Err(StegoError::EmptyStream)
        ));
    }

    #[test]
    fn sweep_embeds_fitting_ratios_and_skips_overflow() {
        // 40 * 40 * 3 = 4800 bits; "Le chiffre" is 80 bits per copy.
        let cover = noisy_grid(40, 40, 3, 11);
        let channels = ChannelOrder::rgb();
        let message = "Le chiffre";
        let ratios = [0.25, 0.5, 1.0];

        let results: Vec<_> = sweep(&cover, message, &ratios, "0", &channels).collect();
        assert_eq!(results.len(), 3);

        let (ratio, quarter) = &results[0];
        assert_eq!(*ratio, 0.25);
        // 4800 * 0.25 / 80 = 15, plus one
        let quarter = quarter.as_ref().unwrap();
        assert_eq!(
            extract_text(quarter, Some("0"), &channels).unwrap(),
            message.repeat(16)
        );

        let half = results[1].1.as_ref().unwrap();
        assert_eq!(
            extract_text(half, Some("0"), &channels).unwrap(),
            message.repeat(31)
        );

        // 61 copies + terminator = 4896 bits
        assert!(matches!(
            results[2].1,
            Err(StegoError::Capacity {
                needed: 4896,
                capacity: 4800
            })
        ));
    }

    #[test]
    fn sweep_uses_the_keyed_order() {
        let cover = noisy_grid(16, 16, 3, 12);
        let channels = ChannelOrder::rgb();
        let order = PixelOrder::keyed(cover.pixel_count(), "0");

        let direct = embed_at_ratio(&cover, "abc", 0.5, &order, &channels).unwrap();
        let (_, swept) = sweep(&cover, "abc", &[0.5], "0", &channels).next().unwrap();
        assert_eq!(swept.unwrap(), direct);
        // 768 * 0.5 / 24 = 16, plus one
        assert_eq!(
            extract_text(&direct, Some("0"), &channels).unwrap(),
            "abc".repeat(17)
        );
    }
}
