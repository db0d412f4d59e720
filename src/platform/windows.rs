#![cfg(target_os = "windows")]

use core::ffi::c_void;

pub(super) const PAGE_EXECUTE_READ: u32 = 0x20;
pub(super) const PAGE_EXECUTE_READWRITE: u32 = 0x40;

#[repr(C)]
struct SystemInfo {
    w_processor_architecture: u16,
    w_reserved: u16,
    dw_page_size: u32,
    lp_minimum_application_address: *mut c_void,
    lp_maximum_application_address: *mut c_void,
    dw_active_processor_mask: usize,
    dw_number_of_processors: u32,
    dw_processor_type: u32,
    dw_allocation_granularity: u32,
    w_processor_level: u16,
    w_processor_revision: u16,
}

extern "system" {
    fn GetSystemInfo(lpSystemInfo: *mut SystemInfo);

    fn VirtualProtect(
        lpAddress: *mut c_void,
        dwSize: usize,
        flNewProtect: u32,
        lpflOldProtect: *mut u32,
    ) -> i32;

    fn FlushInstructionCache(hProcess: *mut c_void, lpBaseAddress: *const c_void, dwSize: usize)
        -> i32;

    fn GetCurrentProcess() -> *mut c_void;
}

pub(super) fn query_page_size() -> Option<usize> {
    unsafe {
        let mut info = core::mem::zeroed::<SystemInfo>();
        GetSystemInfo(&mut info);
        Some(info.dw_page_size as usize)
    }
}

/// Changes the protection of one page starting at `page` to `protect`.
///
/// # Safety
///
/// `page` must be the base address of a page actually mapped into this process.
pub(super) unsafe fn protect(page: usize, len: usize, protect_flags: u32) {
    let mut old_protect: u32 = 0;
    let result = VirtualProtect(
        page as *mut c_void,
        len,
        protect_flags,
        &mut old_protect,
    );

    if result == 0 {
        panic!("VirtualProtect failed for page {:#x}", page);
    }
}

pub(super) unsafe fn clear_cache(start: *mut u8, end: *mut u8) {
    let size = end.offset_from(start) as usize;
    let process = GetCurrentProcess();
    if FlushInstructionCache(process, start as *const c_void, size) == 0 {
        panic!("FlushInstructionCache failed");
    }
}
