use core::{fmt, mem};

use zeroize::Zeroize;

use crate::{
    alloc::{GuardedRegion, Protection},
    Error, Result,
};

/// A byte sequence whose storage always comes from a [`GuardedRegion`].
///
/// The length always equals the length of the owned region. The region is
/// never grown or shrunk in place: [`resize`](Self::resize) maps a new one,
/// copies and releases the old one. An empty buffer owns no region at all.
///
/// Access follows the protection of the region. Reading a
/// [`Protection::NoAccess`] buffer, or writing one that is not
/// [`Protection::ReadWrite`], terminates the process.
pub struct ProtectedBuffer {
    region: Option<GuardedRegion>,
    // Mirrors the region; remembers the last request when there is none.
    protection: Protection,
}

impl ProtectedBuffer {
    /// Creates an empty, read-write buffer. Does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self {
            region: None,
            protection: Protection::ReadWrite,
        }
    }

    /// Allocates a read-write buffer of `len` bytes with unspecified contents.
    pub fn with_len(len: usize) -> Result<Self> {
        let region = match len {
            0 => None,
            len => Some(GuardedRegion::allocate(len).map_err(Error::OutOfMemory)?),
        };

        Ok(Self {
            region,
            protection: Protection::ReadWrite,
        })
    }

    /// Allocates a read-write buffer holding a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut buffer = Self::with_len(bytes.len())?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, GuardedRegion::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.region.is_none()
    }

    #[inline]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Changes the protection of the backing pages.
    pub fn set_protection(&mut self, protection: Protection) -> Result<()> {
        if let Some(region) = self.region.as_mut() {
            region.set_protection(protection).map_err(Error::Protection)?;
        }

        self.protection = protection;
        Ok(())
    }

    /// Views the bytes. Terminates the process if the buffer is not readable.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self.region.as_ref() {
            // A non-readable region faults on first access.
            Some(region) => unsafe { region.as_slice() },
            None => &[],
        }
    }

    /// Views the bytes mutably. Writing through the slice terminates the
    /// process if the buffer is not writable.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.region.as_mut() {
            // A non-writable region faults on first write.
            Some(region) => unsafe { region.as_mut_slice() },
            None => &mut [],
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }

    /// Deep-copies the buffer into a newly mapped region.
    ///
    /// The copy is always read-write, whatever the protection of `self`.
    /// Copying a [`Protection::NoAccess`] buffer terminates the process.
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_slice(self.as_slice())
    }

    /// Changes the length of the buffer.
    ///
    /// A new region is mapped, the common prefix is copied over, new bytes
    /// are zeroed and the old region is wiped and released. The result is
    /// read-write. The buffer must be readable.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len == self.len() {
            return Ok(());
        }

        let mut resized = Self::with_len(new_len)?;
        let keep = self.len().min(new_len);
        let (head, tail) = resized.as_mut_slice().split_at_mut(keep);
        head.copy_from_slice(&self.as_slice()[..keep]);
        tail.fill(0);

        *self = resized;
        Ok(())
    }

    /// Moves the contents out, leaving an empty buffer behind.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }
}

impl Default for ProtectedBuffer {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Wipes the buffer whatever its protection.
///
/// The pages are forced read-write for the wipe and put back to their
/// previous protection afterwards. If the pages cannot be made writable the
/// process is aborted rather than leaving the secret in place.
impl Zeroize for ProtectedBuffer {
    fn zeroize(&mut self) {
        let Some(region) = self.region.as_mut() else {
            return;
        };

        let prior = region.protection();
        if !prior.is_writable() {
            if let Err(err) = region.set_protection(Protection::ReadWrite) {
                log::error!("cannot unlock protected buffer for wiping, aborting: {err}");
                std::process::abort();
            }
        }

        unsafe { region.as_mut_slice() }.zeroize();

        if prior != Protection::ReadWrite {
            if let Err(err) = region.set_protection(prior) {
                log::warn!("protected buffer left read-write after wiping: {err}");
                self.protection = Protection::ReadWrite;
            }
        }
    }
}

impl fmt::Debug for ProtectedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedBuffer")
            .field("len", &self.len())
            .field("protection", &self.protection)
            .finish()
    }
}
