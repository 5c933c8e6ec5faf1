use core::{fmt, ops::Deref};

use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{alloc::Protection, kdf::Strength, Error, Result, SecretKey};

/// A [`SecretKey`] whose length `N` is known at compile time.
///
/// Same contract as [`SecretKey`]; only the operations that cannot change
/// the length are available, so the key always holds exactly `N` bytes.
pub struct Key<const N: usize>(SecretKey);

impl<const N: usize> Key<N> {
    pub const LEN: usize = N;

    /// Creates a key of random bytes and makes it read-only.
    pub fn new() -> Result<Self> {
        SecretKey::new(N).map(Self)
    }

    /// Creates a read-write key with unspecified contents.
    pub fn uninit() -> Result<Self> {
        SecretKey::uninit(N).map(Self)
    }

    /// Rebuilds a read-only key from `N` bytes of existing key material.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != N {
            return Err(Error::invalid_argument(format!(
                "key must be {N} bytes, got {}",
                bytes.len()
            )));
        }

        SecretKey::from_slice(bytes).map(Self)
    }

    /// Derives a read-only key from a password.
    pub fn from_password(
        password: impl AsRef<[u8]>,
        salt: &[u8],
        strength: Strength,
    ) -> Result<Self> {
        SecretKey::from_password(N, password, salt, strength).map(Self)
    }

    /// The key bytes as an array.
    ///
    /// Terminates the process if the key is inaccessible.
    #[inline]
    pub fn as_array(&self) -> &[u8; N] {
        // The wrapped key is always exactly N bytes long.
        unsafe { &*(self.0.as_bytes().as_ptr() as *const [u8; N]) }
    }

    #[inline]
    pub fn as_secret(&self) -> &SecretKey {
        &self.0
    }

    #[inline]
    pub fn into_secret(self) -> SecretKey {
        self.0
    }

    pub fn randomize(&mut self) -> Result<()> {
        self.0.randomize()
    }

    pub fn derive_from_password(
        &mut self,
        password: impl AsRef<[u8]>,
        salt: &[u8],
        strength: Strength,
    ) -> Result<()> {
        self.0.derive_from_password(password, salt, strength)
    }

    pub fn zeroize(&mut self) {
        self.0.zeroize()
    }

    pub fn set_protection(&mut self, protection: Protection) -> Result<()> {
        self.0.set_protection(protection)
    }

    pub fn noaccess(&mut self) -> Result<()> {
        self.0.noaccess()
    }

    pub fn readonly(&mut self) -> Result<()> {
        self.0.readonly()
    }

    pub fn readwrite(&mut self) -> Result<()> {
        self.0.readwrite()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr()
    }

    pub fn try_clone(&self) -> Result<Self> {
        self.0.try_clone().map(Self)
    }
}

impl<const N: usize> Deref for Key<N> {
    type Target = SecretKey;

    #[inline]
    fn deref(&self) -> &SecretKey {
        &self.0
    }
}

impl<const N: usize> TryFrom<SecretKey> for Key<N> {
    type Error = Error;

    fn try_from(key: SecretKey) -> Result<Self> {
        if key.len() != N {
            return Err(Error::invalid_argument(format!(
                "key must be {N} bytes, got {}",
                key.len()
            )));
        }

        Ok(Self(key))
    }
}

impl<const N: usize> Zeroize for Key<N> {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl<const N: usize> ZeroizeOnDrop for Key<N> {}

impl<const N: usize> ConstantTimeEq for Key<N> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl<const N: usize> PartialEq for Key<N> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<const N: usize> Eq for Key<N> {}

impl<const N: usize> fmt::Debug for Key<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("len", &N)
            .field("protection", &self.0.protection())
            .finish()
    }
}
