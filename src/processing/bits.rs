//! # Bit Codec
//!
//! Converts text to a flat bit stream and back.
//!
//! Each character is written as its code point in 8 bits, most significant
//! bit first. An encoded payload ends with the reserved terminator `##`,
//! encoded the same way. Decoding stops at the first point where the two most
//! recently decoded characters spell the terminator.
//!
//! The terminator is not escaped: a payload that itself contains `##` is cut
//! short on decode.

use crate::common::error::{Result, StegoError};

/// Two-character sequence that marks the end of an embedded payload.
pub const TERMINATOR: &str = "##";

/// Bits per encoded character.
pub const CHAR_BITS: usize = 8;

/// An ordered sequence of bits, each stored as `0` or `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<u8>,
}

impl BitStream {
    /// Builds a stream from raw bit values. Any non-zero value counts as `1`.
    pub fn from_bits<I: IntoIterator<Item = u8>>(bits: I) -> Self {
        Self {
            bits: bits.into_iter().map(|b| (b != 0) as u8).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.bits.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.bits.iter().copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    fn push_char(&mut self, code: u8) {
        for shift in (0..CHAR_BITS).rev() {
            self.bits.push((code >> shift) & 1);
        }
    }
}

/// Encodes `payload` followed by the terminator.
///
/// # Errors
/// [`StegoError::Encoding`] for the first character above U+00FF.
pub fn encode(payload: &str) -> Result<BitStream> {
    let mut stream = encode_raw(payload)?;
    for ch in TERMINATOR.chars() {
        stream.push_char(ch as u8);
    }
    Ok(stream)
}

/// Encodes `payload` without a terminator.
///
/// Used for the wrap policy, where the stream repeats and carries no boundary.
pub fn encode_raw(payload: &str) -> Result<BitStream> {
    let mut stream = BitStream {
        bits: Vec::with_capacity((payload.len() + TERMINATOR.len()) * CHAR_BITS),
    };
    for (position, ch) in payload.chars().enumerate() {
        let code = u32::from(ch);
        let byte = u8::try_from(code).map_err(|_| StegoError::Encoding {
            ch,
            code,
            position,
        })?;
        stream.push_char(byte);
    }
    Ok(stream)
}

/// Decodes a complete stream, returning the text before the terminator.
///
/// # Errors
/// [`StegoError::Truncation`] if the stream ends before the terminator.
/// Trailing bits that do not fill a whole character are ignored.
pub fn decode(bits: &BitStream) -> Result<String> {
    let mut decoder = TextDecoder::new();
    for bit in bits.iter() {
        if let Some(payload) = decoder.push(bit) {
            return Ok(payload);
        }
    }
    Err(StegoError::Truncation {
        bits_read: decoder.bits_read(),
    })
}

/// Incremental decoder fed one bit at a time.
///
/// Lets a reader stop pulling bits out of an image as soon as the terminator
/// has been seen.
#[derive(Debug, Default)]
pub struct TextDecoder {
    current: u8,
    filled: usize,
    bits_read: usize,
    chars: Vec<char>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one bit. Returns the payload once the terminator completes.
    pub fn push(&mut self, bit: u8) -> Option<String> {
        self.current = (self.current << 1) | (bit & 1);
        self.filled += 1;
        self.bits_read += 1;

        if self.filled < CHAR_BITS {
            return None;
        }

        self.chars.push(char::from(self.current));
        self.current = 0;
        self.filled = 0;

        if self.ends_with_terminator() {
            let keep = self.chars.len() - TERMINATOR.len();
            Some(self.chars[..keep].iter().collect())
        } else {
            None
        }
    }

    /// Total bits consumed so far.
    pub fn bits_read(&self) -> usize {
        self.bits_read
    }

    fn ends_with_terminator(&self) -> bool {
        let n = TERMINATOR.len();
        self.chars.len() >= n
            && self.chars[self.chars.len() - n..]
                .iter()
                .copied()
                .eq(TERMINATOR.chars())
    }
}
