use core::{
    mem::MaybeUninit,
    ptr::{self, NonNull},
};
use std::io;

use windows_sys::Win32::System::{Memory as win, SystemInformation as win_info};

use super::super::Protection;

impl Protection {
    #[inline]
    fn as_page_flags(self) -> win::PAGE_PROTECTION_FLAGS {
        match self {
            Protection::NoAccess => win::PAGE_NOACCESS,
            Protection::ReadOnly => win::PAGE_READONLY,
            Protection::ReadWrite => win::PAGE_READWRITE,
        }
    }
}

/// Reserves and commits a read-write memory region.
///
/// Wraps the `VirtualAlloc` system call.
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
    let flags = win::MEM_COMMIT | win::MEM_RESERVE;
    match unsafe { win::VirtualAlloc(ptr::null(), len, flags, win::PAGE_READWRITE) } {
        ptr if ptr.is_null() => Err(io::Error::last_os_error()),
        ptr => Ok(unsafe { NonNull::new_unchecked(ptr as *mut u8) }),
    }
}

/// Changes the protection on a range of committed pages.
///
/// Wraps the `VirtualProtect` system call.
///
/// # Arguments
///
/// * `ptr` - A page-aligned, non-null pointer into a committed region.
/// * `len` - The length of the range, a multiple of the page size.
/// * `prot` - The protection the range must have afterwards.
pub fn protect(ptr: NonNull<u8>, len: usize, prot: Protection) -> io::Result<()> {
    let mut old_protect: win::PAGE_PROTECTION_FLAGS = 0;
    let flags = prot.as_page_flags();
    match unsafe { win::VirtualProtect(ptr.as_ptr() as _, len, flags, &mut old_protect) } {
        0 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Locks a memory range into the working set.
///
/// Wraps the `VirtualLock` system call.
pub fn lock(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    match unsafe { win::VirtualLock(ptr.as_ptr() as _, len) } {
        0 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Unlocks a memory range, allowing it to be paged out.
///
/// Wraps the `VirtualUnlock` system call.
pub fn unlock(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    match unsafe { win::VirtualUnlock(ptr.as_ptr() as _, len) } {
        0 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Windows has no per-range dump exclusion; kept for parity with Unix.
#[inline]
pub fn exclude_from_dumps(_ptr: NonNull<u8>, _len: usize) -> io::Result<()> {
    Ok(())
}

#[inline]
pub fn include_in_dumps(_ptr: NonNull<u8>, _len: usize) -> io::Result<()> {
    Ok(())
}

/// Releases a region reserved by [`map`].
///
/// Wraps the `VirtualFree` system call. `MEM_RELEASE` requires a size of
/// zero, the whole reservation is released.
pub fn unmap(ptr: NonNull<u8>, _len: usize) -> io::Result<()> {
    match unsafe { win::VirtualFree(ptr.as_ptr() as _, 0, win::MEM_RELEASE) } {
        0 => Err(io::Error::last_os_error()),
        _ => Ok(()),
    }
}

/// Retrieves the system's page size.
///
/// Wraps the `GetSystemInfo` system call.
#[inline]
pub fn page_size() -> usize {
    let sys_info = {
        let mut sys_info = MaybeUninit::<win_info::SYSTEM_INFO>::uninit();
        unsafe {
            win_info::GetSystemInfo(sys_info.as_mut_ptr());
            sys_info.assume_init()
        }
    };

    sys_info.dwPageSize as usize
}
