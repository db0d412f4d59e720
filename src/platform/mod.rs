//! Per-OS primitives the commit engine needs: page size, page-permission
//! transitions, and instruction-cache invalidation after a code rewrite.
//!
//! Mirrors the host-facing contracts of §6 (`pagesize`, `mprotect`) behind a
//! small platform-neutral facade so [`crate::engine::ppc`] never has to know
//! which OS it is running on.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

use std::sync::OnceLock;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Returns the host page size in bytes, querying the OS at most once per process.
pub(crate) fn page_size() -> Option<usize> {
    if let Some(&size) = PAGE_SIZE.get() {
        return Some(size);
    }

    let size = query_page_size()?;
    Some(*PAGE_SIZE.get_or_init(|| size))
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn query_page_size() -> Option<usize> {
    #[cfg(target_os = "linux")]
    return linux::query_page_size();
    #[cfg(target_os = "macos")]
    return macos::query_page_size();
}

#[cfg(target_os = "windows")]
fn query_page_size() -> Option<usize> {
    windows::query_page_size()
}

/// Makes the page starting at `page` writable, readable and executable.
///
/// # Safety
///
/// `page` must be the page-aligned base address of a page mapped into this
/// process and `len` must be the host page size. `mprotect` failure is
/// treated as fatal per §7: it aborts the process rather than returning an
/// error, since the text segment would otherwise be left in an indeterminate
/// permission state.
pub(crate) unsafe fn mprotect_rwx(page: usize, len: usize) {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        let result = libc::mprotect(
            page as *mut libc::c_void,
            len,
            libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
        );
        if result != 0 {
            panic!("mprotect(RWX) failed for page {:#x}", page);
        }
    }

    #[cfg(target_os = "windows")]
    {
        windows::protect(page, len, windows::PAGE_EXECUTE_READWRITE);
    }
}

/// Restores the page starting at `page` to read+execute, not writable.
///
/// Same safety and fatal-failure contract as [`mprotect_rwx`].
pub(crate) unsafe fn mprotect_rx(page: usize, len: usize) {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        let result = libc::mprotect(
            page as *mut libc::c_void,
            len,
            libc::PROT_READ | libc::PROT_EXEC,
        );
        if result != 0 {
            panic!("mprotect(RX) failed for page {:#x}", page);
        }
    }

    #[cfg(target_os = "windows")]
    {
        windows::protect(page, len, windows::PAGE_EXECUTE_READ);
    }
}

/// Invalidates any cached instructions in `[start, end)` after a code rewrite.
///
/// # Safety
///
/// `[start, end)` must be a valid, initialized range of executable memory.
pub(crate) unsafe fn clear_cache(start: *mut u8, end: *mut u8) {
    #[cfg(target_os = "linux")]
    linux::clear_cache(start, end);
    #[cfg(target_os = "macos")]
    macos::clear_cache(start, end);
    #[cfg(target_os = "windows")]
    windows::clear_cache(start, end);

    // On ARM64, explicitly synchronize the CPU pipeline after the cache flush.
    #[cfg(target_arch = "aarch64")]
    {
        core::arch::asm!("dsb sy", "isb", options(nostack, nomem));
    }
}
