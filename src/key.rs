use core::fmt;

use rand::{rngs::OsRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    alloc::Protection,
    buffer::ProtectedBuffer,
    kdf::{Derivation, KdfParams, Strength},
    Result,
};

/// Key material of a length chosen at runtime, kept in guarded memory.
///
/// A key can be created filled with random bytes, left uninitialized for a
/// later derivation, derived from a password and a salt, or rebuilt from
/// existing bytes. Its bytes only change through [`randomize`],
/// [`derive_from_password`] and [`zeroize`].
///
/// The pages holding the key can be made read-only or inaccessible when
/// the key is not in use; it is a good idea to keep them as restricted as
/// possible. Touching the bytes in a way the current protection forbids
/// terminates the process.
///
/// A dropped key is wiped and its pages released, whatever its protection.
///
/// Keys compare in constant time: the lengths first, then every byte.
///
/// [`randomize`]: SecretKey::randomize
/// [`derive_from_password`]: SecretKey::derive_from_password
/// [`zeroize`]: SecretKey::zeroize
#[derive(Default)]
pub struct SecretKey {
    buffer: ProtectedBuffer,
}

impl SecretKey {
    /// Creates a key of `len` random bytes and makes it read-only.
    pub fn new(len: usize) -> Result<Self> {
        Self::with_init(len, true)
    }

    /// Creates a key of `len` bytes.
    ///
    /// With `initialize`, the key is filled with random bytes and made
    /// read-only. Without, it is left read-write with unspecified contents,
    /// ready for [`derive_from_password`](Self::derive_from_password).
    pub fn with_init(len: usize, initialize: bool) -> Result<Self> {
        let mut key = Self {
            buffer: ProtectedBuffer::with_len(len)?,
        };

        if initialize {
            key.randomize()?;
            key.readonly()?;
        }

        Ok(key)
    }

    /// Creates a read-write key of `len` bytes with unspecified contents.
    pub fn uninit(len: usize) -> Result<Self> {
        Self::with_init(len, false)
    }

    /// Rebuilds a key from existing key material, read-only.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut key = Self {
            buffer: ProtectedBuffer::from_slice(bytes)?,
        };
        key.readonly()?;
        Ok(key)
    }

    /// Derives a read-only key of `len` bytes from a password.
    ///
    /// See [`derive_from_password`](Self::derive_from_password).
    pub fn from_password(
        len: usize,
        password: impl AsRef<[u8]>,
        salt: &[u8],
        strength: Strength,
    ) -> Result<Self> {
        let mut key = Self::uninit(len)?;
        key.derive_from_password(password, salt, strength)?;
        Ok(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn protection(&self) -> Protection {
        self.buffer.protection()
    }

    /// Overwrites the key with fresh random bytes.
    ///
    /// The key must be read-write: calling this on a read-only or
    /// inaccessible key terminates the process.
    pub fn randomize(&mut self) -> Result<()> {
        let bytes = self.buffer.as_mut_slice();
        // Plain stores first, so a locked key faults here and not in a syscall.
        bytes.zeroize();
        OsRng.try_fill_bytes(bytes)?;
        Ok(())
    }

    /// Derives the key bytes from `password` and `salt` with Argon2id.
    ///
    /// Exactly [`len`](Self::len) bytes are derived; the cost is chosen by
    /// `strength`. The salt must be [`SALT_LEN`](crate::SALT_LEN) bytes long.
    ///
    /// Arguments are validated before anything is touched: on
    /// `InvalidArgument` the key keeps its bytes and protection. Otherwise
    /// the key is unlocked for the derivation and left read-only afterwards,
    /// on failure too, in which case its bytes are zeroed.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`](crate::Error::InvalidArgument) for a salt
    ///   of the wrong size or a key length the derivation cannot produce.
    /// * [`Error::ResourceExhausted`](crate::Error::ResourceExhausted) when
    ///   the working memory cannot be allocated.
    pub fn derive_from_password(
        &mut self,
        password: impl AsRef<[u8]>,
        salt: &[u8],
        strength: Strength,
    ) -> Result<()> {
        self.derive_with_params(password.as_ref(), salt, strength.params())
    }

    pub(crate) fn derive_with_params(
        &mut self,
        password: &[u8],
        salt: &[u8],
        params: KdfParams,
    ) -> Result<()> {
        let derivation = Derivation::new(salt, params, self.len())?;

        self.readwrite()?;
        let derived = derivation.run(password, self.buffer.as_mut_slice());
        if derived.is_err() {
            self.buffer.as_mut_slice().zeroize();
        }
        let relocked = self.readonly();

        derived.and(relocked)
    }

    /// Overwrites every byte with zero, whatever the protection.
    ///
    /// The protection in place before the call is restored. The key keeps
    /// its length and can be derived or randomized again.
    pub fn zeroize(&mut self) {
        self.buffer.zeroize();
    }

    /// Changes the protection of the pages holding the key.
    pub fn set_protection(&mut self, protection: Protection) -> Result<()> {
        self.buffer.set_protection(protection)
    }

    /// Makes the key inaccessible; any access terminates the process.
    pub fn noaccess(&mut self) -> Result<()> {
        self.set_protection(Protection::NoAccess)
    }

    /// Makes the key read-only; any write terminates the process.
    pub fn readonly(&mut self) -> Result<()> {
        self.set_protection(Protection::ReadOnly)
    }

    /// Makes the key readable and writable again.
    pub fn readwrite(&mut self) -> Result<()> {
        self.set_protection(Protection::ReadWrite)
    }

    /// The key bytes, for the primitives consuming them.
    ///
    /// Terminates the process if the key is inaccessible.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Raw pointer for primitives writing key material directly.
    ///
    /// At most [`len`](Self::len) bytes may be written, and only while the
    /// key is read-write.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.as_mut_ptr()
    }

    /// Deep-copies the key into freshly mapped pages.
    ///
    /// The copy is read-write even when `self` is read-only; restrict it
    /// again if needed. Copying an inaccessible key terminates the process.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            buffer: self.buffer.try_clone()?,
        })
    }

    /// Moves the key out, leaving an empty key behind.
    #[inline]
    pub fn take(&mut self) -> Self {
        Self {
            buffer: self.buffer.take(),
        }
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        SecretKey::zeroize(self)
    }
}

// Dropping the buffer wipes and releases its region.
impl ZeroizeOnDrop for SecretKey {}

impl ConstantTimeEq for SecretKey {
    /// Unequal lengths return early; equal lengths compare every byte.
    fn ct_eq(&self, other: &Self) -> Choice {
        self.as_bytes().ct_eq(other.as_bytes())
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        log::trace!("comparing secret keys of {} and {} bytes", self.len(), other.len());
        self.ct_eq(other).into()
    }
}

impl Eq for SecretKey {}

/// Never shows the key bytes.
impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.len())
            .field("protection", &self.protection())
            .finish()
    }
}
