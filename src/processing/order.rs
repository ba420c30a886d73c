//! # Pixel Visitation Order
//!
//! Decides which pixel receives the next group of payload bits.
//!
//! - **Sequential**: plain row-major order.
//! - **Keyed**: a Fisher-Yates permutation driven by a ChaCha20 PRNG whose
//!   seed is the SHA-256 digest of a password. The generator lives only for
//!   the duration of one [`PixelOrder::keyed`] call.
//!
//! # Cross-platform portability
//!
//! The shuffle draws from `u64` ranges rather than `usize`, so 32-bit and
//! 64-bit targets consume the same amount of PRNG output per step and build
//! identical permutations for the same password.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// A permutation of the pixel indices `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelOrder {
    indices: Vec<usize>,
}

impl PixelOrder {
    /// Identity order `[0, 1, ..., n-1]`.
    pub fn sequential(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
        }
    }

    /// Password-seeded permutation of `0..n`.
    ///
    /// The same `(n, password)` pair always produces the same order, which is
    /// what lets the extractor find the bits again.
    pub fn keyed(n: usize, password: &str) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha20Rng::from_seed(derive_seed(password));
        for i in (1..n).rev() {
            let j = rng.gen_range(0..=(i as u64)) as usize;
            indices.swap(i, j);
        }
        debug!("Built keyed order over {} pixels", n);
        Self { indices }
    }

    /// Keyed order when a password is given, sequential otherwise.
    ///
    /// `Some("")` is a real password and still selects the keyed order.
    pub fn for_password(n: usize, password: Option<&str>) -> Self {
        match password {
            Some(password) => Self::keyed(n, password),
            None => Self::sequential(n),
        }
    }

    /// Number of pixels covered.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

/// Stable password-to-seed mapping.
fn derive_seed(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}
