//! Thin, platform-specific wrappers around the virtual memory system calls.
//!
//! Both backends expose the same set of functions so that
//! [`GuardedRegion`](super::GuardedRegion) stays platform-agnostic.

#[cfg(target_family = "unix")]
mod unix;
#[cfg(target_family = "unix")]
pub use self::unix::*;

#[cfg(target_family = "windows")]
mod windows;
#[cfg(target_family = "windows")]
pub use self::windows::*;
