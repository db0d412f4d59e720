#![cfg(target_os = "macos")]

extern "C" {
    /// Prepares memory for execution, typically by invalidating the instruction cache for the
    /// indicated range.
    pub(super) fn sys_icache_invalidate(start: *mut u8, len: usize);
}

pub(super) unsafe fn clear_cache(start: *mut u8, end: *mut u8) {
    let len = end.offset_from(start) as usize;
    sys_icache_invalidate(start, len);
}

pub(super) fn query_page_size() -> Option<usize> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        None
    } else {
        Some(size as usize)
    }
}
