use std::sync::OnceLock;

mod ffi;
mod region;

pub use region::GuardedRegion;

/// Access permissions of the pages backing a [`GuardedRegion`].
///
/// Touching a region in a way its current protection forbids is not an
/// error the caller can handle: the MMU raises a fault and the process is
/// terminated (`SIGSEGV`/`SIGBUS` on Unix, an access violation on Windows).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Protection {
    /// Neither reads nor writes are allowed.
    NoAccess,
    /// Reads are allowed, writes fault.
    ReadOnly,
    /// Reads and writes are allowed.
    #[default]
    ReadWrite,
}

impl Protection {
    /// Whether the bytes may be read under this protection.
    #[inline]
    pub const fn is_readable(self) -> bool {
        !matches!(self, Protection::NoAccess)
    }

    /// Whether the bytes may be written under this protection.
    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self, Protection::ReadWrite)
    }
}

/// Retrieves the system's page size.
///
/// # Platform-specific behavior
/// - **Unix-based systems (Linux, macOS, etc.):**
///   - On macOS, this function uses `libc::vm_page_size` to determine the page size.
///   - On other Unix systems, it uses `libc::sysconf` to get the page size.
///
/// - **Windows:** The function retrieves the page size by calling `GetSystemInfo`
///   and extracting the `dwPageSize` field from the `SYSTEM_INFO` structure.
///
/// The value is queried once and cached for the lifetime of the process.
pub fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(ffi::page_size)
}
