#![cfg(target_os = "linux")]

extern "C" {
    /// Flushes the CPU instruction cache (provided by glibc on Linux).
    pub(super) fn __clear_cache(start: *mut u8, end: *mut u8);
}

pub(super) unsafe fn clear_cache(start: *mut u8, end: *mut u8) {
    __clear_cache(start, end);
}

pub(super) fn query_page_size() -> Option<usize> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        None
    } else {
        Some(size as usize)
    }
}
