use core::ptr::{self, NonNull};
use std::io;

use super::super::Protection;

impl Protection {
    #[inline]
    fn as_prot_flags(self) -> libc::c_int {
        match self {
            Protection::NoAccess => libc::PROT_NONE,
            Protection::ReadOnly => libc::PROT_READ,
            Protection::ReadWrite => libc::PROT_READ | libc::PROT_WRITE,
        }
    }
}

/// Maps a private, anonymous, read-write memory region.
///
/// Wraps the `mmap` system call.
///
/// # Arguments
///
/// * `len` - The length of the memory region, a multiple of the page size.
///
/// # Returns
///
/// * A result containing a non-null pointer to the start of the region on
///   success, or an I/O error on failure.
pub fn map(len: usize) -> io::Result<NonNull<u8>> {
    let mmap = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANON,
            -1,
            0,
        )
    };

    if mmap == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    Ok(unsafe { NonNull::new_unchecked(mmap as *mut u8) })
}

/// Changes the access protection of whole pages.
///
/// Wraps the `mprotect` system call.
///
/// # Arguments
///
/// * `ptr` - A page-aligned, non-null pointer into a mapped region.
/// * `len` - The length of the range, a multiple of the page size.
/// * `prot` - The protection the range must have afterwards.
pub fn protect(ptr: NonNull<u8>, len: usize, prot: Protection) -> io::Result<()> {
    match unsafe { libc::mprotect(ptr.as_ptr() as _, len, prot.as_prot_flags()) } {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Locks a memory range, preventing it from being paged out to swap.
///
/// Wraps the `mlock` system call.
pub fn lock(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    match unsafe { libc::mlock(ptr.as_ptr() as _, len) } {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Unlocks a memory range, allowing it to be paged out to swap.
///
/// Wraps the `munlock` system call.
pub fn unlock(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    match unsafe { libc::munlock(ptr.as_ptr() as _, len) } {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Asks the kernel to leave a memory range out of core dumps.
///
/// Wraps `madvise(MADV_DONTDUMP)` on Linux and `madvise(MADV_NOCORE)` on
/// FreeBSD/DragonFly. A no-op on other Unix systems.
pub fn exclude_from_dumps(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    let advice = Some(libc::MADV_DONTDUMP);
    #[cfg(any(target_os = "freebsd", target_os = "dragonfly"))]
    let advice = Some(libc::MADV_NOCORE);
    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "dragonfly"
    )))]
    let advice: Option<libc::c_int> = None;

    self::madvise(ptr, len, advice)
}

/// Reverts [`exclude_from_dumps`] before the range is handed back to the
/// kernel.
pub fn include_in_dumps(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    let advice = Some(libc::MADV_DODUMP);
    #[cfg(any(target_os = "freebsd", target_os = "dragonfly"))]
    let advice = Some(libc::MADV_CORE);
    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "dragonfly"
    )))]
    let advice: Option<libc::c_int> = None;

    self::madvise(ptr, len, advice)
}

/// Unmaps a memory region.
///
/// Wraps the `munmap` system call.
///
/// # Arguments
///
/// * `ptr` - The pointer returned by [`map`].
/// * `len` - The length given to [`map`].
pub fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    match unsafe { libc::munmap(ptr.as_ptr() as _, len) } {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Retrieves the system's page size.
///
/// Wraps the `sysconf` system call on Unix-like systems
/// and `vm_page_size` on macOS.
#[inline]
pub fn page_size() -> usize {
    #[cfg(target_os = "macos")]
    unsafe {
        libc::vm_page_size as usize
    }
    #[cfg(not(target_os = "macos"))]
    unsafe {
        libc::sysconf(libc::_SC_PAGESIZE) as usize
    }
}

#[inline]
fn madvise(ptr: NonNull<u8>, len: usize, advice: Option<libc::c_int>) -> io::Result<()> {
    let Some(advice) = advice else {
        return Ok(());
    };

    match unsafe { libc::madvise(ptr.as_ptr() as _, len, advice) } {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}
