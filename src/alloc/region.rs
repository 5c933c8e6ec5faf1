use core::ptr::{self, NonNull};
use std::io;

use zeroize::Zeroize;

use super::{ffi, page_size, Protection};

/// A fixed-size memory region backed by its own virtual pages and fenced by
/// guard pages.
///
/// The mapping looks like this:
///
/// ```text
/// | guard page | data pages ............ [  len bytes  ] | guard page |
///   NoAccess     protection toggled on demand               NoAccess
/// ```
///
/// The bytes are pushed against the trailing guard page, so running past the
/// end of the region faults on the very first out-of-bounds byte. Running
/// past the start hits the slack of the first data page and then the leading
/// guard page.
///
/// Data pages are locked in memory and excluded from core dumps where the
/// platform allows it. Both are best-effort: a refusal is logged, it does not
/// fail the allocation.
///
/// Dropping the region makes its pages writable, zeroes them and unmaps the
/// whole mapping, whatever the current protection is.
pub struct GuardedRegion {
    base: NonNull<u8>,
    data: NonNull<u8>,
    len: usize,
    data_pages_len: usize,
    protection: Protection,
}

// The region is exclusively owned and all mutation goes through `&mut self`.
unsafe impl Send for GuardedRegion {}
unsafe impl Sync for GuardedRegion {}

impl GuardedRegion {
    /// Maps a new region of exactly `len` bytes, initially read-write.
    ///
    /// The initial contents are unspecified.
    ///
    /// # Errors
    /// * `InvalidInput` if `len` is zero or too large to be mapped.
    /// * The OS error if the pages could not be mapped or fenced.
    pub fn allocate(len: usize) -> io::Result<Self> {
        if !(len > 0 && len <= isize::MAX as usize) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "length out of bounds",
            ));
        }

        let page = page_size();
        // `page` is a power of two
        let (data_pages_len, total_len) = len
            .checked_add(page - 1)
            .map(|padded| padded & !(page - 1))
            .and_then(|data| Some((data, data.checked_add(2 * page)?)))
            .filter(|(_, total)| *total <= isize::MAX as usize)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "length out of bounds")
            })?;

        let base = ffi::map(total_len)?;
        let data_pages = unsafe { NonNull::new_unchecked(base.as_ptr().add(page)) };
        let trailing_guard =
            unsafe { NonNull::new_unchecked(data_pages.as_ptr().add(data_pages_len)) };

        let fenced = ffi::protect(base, page, Protection::NoAccess)
            .and_then(|()| ffi::protect(trailing_guard, page, Protection::NoAccess));
        if let Err(err) = fenced {
            let _ = ffi::unmap(base, total_len);
            return Err(err);
        }

        if let Err(err) = ffi::lock(data_pages, data_pages_len) {
            log::warn!("could not lock {data_pages_len} bytes of guarded memory: {err}");
        }
        if let Err(err) = ffi::exclude_from_dumps(data_pages, data_pages_len) {
            log::warn!("could not exclude guarded memory from core dumps: {err}");
        }

        let data =
            unsafe { NonNull::new_unchecked(data_pages.as_ptr().add(data_pages_len - len)) };

        log::debug!("mapped guarded region of {len} bytes ({total_len} bytes with guard pages)");

        Ok(Self {
            base,
            data,
            len,
            data_pages_len,
            protection: Protection::ReadWrite,
        })
    }

    /// Number of usable bytes; fixed at allocation time.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: empty regions cannot be allocated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The protection last applied to the data pages.
    #[inline]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Changes the protection of the data pages.
    ///
    /// The change applies to whole pages, the slack before the bytes included.
    pub fn set_protection(&mut self, protection: Protection) -> io::Result<()> {
        ffi::protect(self.data_pages(), self.data_pages_len, protection)?;
        self.protection = protection;
        Ok(())
    }

    /// Zeroes and unmaps the region.
    ///
    /// Equivalent to dropping it; taking `self` by value makes a second
    /// release impossible.
    #[inline]
    pub fn release(self) {
        drop(self)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Views the bytes of the region.
    ///
    /// # Safety
    /// The region must be readable. Reading a [`Protection::NoAccess`] region
    /// through the returned slice terminates the process.
    #[inline]
    pub unsafe fn as_slice(&self) -> &[u8] {
        unsafe { &*ptr::slice_from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// Views the bytes of the region mutably.
    ///
    /// # Safety
    /// The region must be writable. Writing through the returned slice while
    /// the region is [`Protection::ReadOnly`] or [`Protection::NoAccess`]
    /// terminates the process.
    #[inline]
    pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { &mut *ptr::slice_from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    #[inline]
    fn data_pages(&self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(page_size())) }
    }
}

impl Drop for GuardedRegion {
    fn drop(&mut self) {
        let data_pages = self.data_pages();

        if self.protection != Protection::ReadWrite {
            if let Err(err) = self.set_protection(Protection::ReadWrite) {
                log::error!("cannot unlock guarded region for wiping, aborting: {err}");
                std::process::abort();
            }
        }

        Zeroize::zeroize({
            let pages = ptr::slice_from_raw_parts_mut(data_pages.as_ptr(), self.data_pages_len);
            unsafe { &mut *pages }
        });

        // May fail (unchecked)
        let _ = ffi::include_in_dumps(data_pages, self.data_pages_len);
        let _ = ffi::unlock(data_pages, self.data_pages_len);

        let total_len = self.data_pages_len + 2 * page_size();
        match ffi::unmap(self.base, total_len) {
            Ok(()) => log::debug!("unmapped guarded region of {} bytes", self.len),
            Err(err) => log::error!("could not unmap wiped guarded region: {err}"),
        }
    }
}

impl core::fmt::Debug for GuardedRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GuardedRegion")
            .field("len", &self.len)
            .field("protection", &self.protection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_exact_length() {
        for len in [1, 7, 32, 4095, 4096, 4097, 3 * 4096 + 5] {
            let region = GuardedRegion::allocate(len).expect("Failed to allocate region");
            assert_eq!(region.len(), len);
            assert_eq!(region.protection(), Protection::ReadWrite);
        }
    }

    #[test]
    fn allocate_zero_is_rejected() {
        let err = GuardedRegion::allocate(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn allocate_huge_is_rejected() {
        let err = GuardedRegion::allocate(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn bytes_end_at_the_trailing_guard_page() {
        let region = GuardedRegion::allocate(100).expect("Failed to allocate region");
        let end = region.as_ptr() as usize + region.len();
        assert_eq!(end % page_size(), 0);
    }

    #[test]
    fn write_then_read_back() {
        let mut region = GuardedRegion::allocate(64).expect("Failed to allocate region");
        unsafe { region.as_mut_slice() }.copy_from_slice(&[0xA5; 64]);
        assert_eq!(unsafe { region.as_slice() }, &[0xA5; 64]);
    }

    #[test]
    fn protection_round_trip_keeps_contents() {
        let mut region = GuardedRegion::allocate(48).expect("Failed to allocate region");
        unsafe { region.as_mut_slice() }.fill(0x42);

        region.set_protection(Protection::NoAccess).unwrap();
        assert_eq!(region.protection(), Protection::NoAccess);

        region.set_protection(Protection::ReadOnly).unwrap();
        assert_eq!(region.protection(), Protection::ReadOnly);
        assert!(unsafe { region.as_slice() }.iter().all(|b| *b == 0x42));

        region.set_protection(Protection::ReadWrite).unwrap();
        let bytes = unsafe { region.as_mut_slice() };
        bytes[0] = 1;
        assert_eq!(unsafe { region.as_slice() }[0], 1);
    }

    #[test]
    fn release_from_any_protection() {
        for protection in [
            Protection::NoAccess,
            Protection::ReadOnly,
            Protection::ReadWrite,
        ] {
            let mut region = GuardedRegion::allocate(16).expect("Failed to allocate region");
            region.set_protection(protection).unwrap();
            region.release();
        }
    }
}
