use core::hint::black_box;

use rand::{rngs::OsRng, RngCore};

use crate::{util::hex::to_hex, Error, Result};

/// A public number used once per key and message.
///
/// Nonces are not secret and live in ordinary memory. They must never repeat
/// under the same key: either draw them at random, or [`increment`] after
/// every message.
///
/// [`increment`]: Nonce::increment
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce<const N: usize>([u8; N]);

impl<const N: usize> Nonce<N> {
    pub const LEN: usize = N;

    pub const fn zero() -> Self {
        Self([0; N])
    }

    pub fn random() -> Result<Self> {
        let mut nonce = Self::zero();
        OsRng.try_fill_bytes(&mut nonce.0)?;
        Ok(nonce)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        <[u8; N]>::try_from(bytes).map(Self).map_err(|_| {
            Error::invalid_argument(format!("nonce must be {N} bytes, got {}", bytes.len()))
        })
    }

    /// Adds one, reading the bytes as a little-endian integer and wrapping
    /// around on overflow.
    ///
    /// The carry is propagated through every byte, so timing does not depend
    /// on where it stops.
    pub fn increment(&mut self) {
        let mut carry = 1u8;
        for byte in self.0.iter_mut() {
            let (sum, overflow) = black_box(*byte).overflowing_add(black_box(carry));
            *byte = sum;
            carry = black_box(overflow as u8);
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> Default for Nonce<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> From<[u8; N]> for Nonce<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> AsRef<[u8]> for Nonce<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> core::fmt::Debug for Nonce<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Nonce({})", to_hex(self.0))
    }
}
