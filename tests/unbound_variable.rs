//! A variant guarded by a variable that was never bound is never eligible,
//! and an unconditionally-ineligible commit never touches the call site.

use multiverse_commit::{
    Assignment, CompileUnit, ManagedFunction, MultiverseEngine, PatchKind, PatchPoint,
    TrackedVariable, ValueRange, Variant, VarWidth,
};
use std::sync::Arc;

const GENERIC_BYTES: [u8; 5] = [0x48, 0x83, 0xEC, 0x08, 0x90];

fn map_executable_page() -> *mut u8 {
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            page_size,
            libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
            libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
            -1,
            0,
        )
    };
    assert_ne!(ptr, libc::MAP_FAILED);
    ptr as *mut u8
}

#[test]
fn never_bound_variable_leaves_call_site_generic() {
    let call_site = map_executable_page();
    unsafe { std::ptr::copy_nonoverlapping(GENERIC_BYTES.as_ptr(), call_site, 5) };

    let variant_address = map_executable_page() as usize;

    let storage = Box::leak(Box::new(7u32));
    let variable = Arc::new(TrackedVariable::new(
        storage as *mut u32 as usize,
        VarWidth::Four,
        true,
    ));
    // Deliberately never bound.

    let variants = vec![Variant::new(
        variant_address,
        vec![Assignment::new(variable.clone(), ValueRange::new(0, 100))],
    )];
    let patch_points = vec![PatchPoint::new(
        PatchKind::Call,
        Some(call_site as usize),
        GENERIC_BYTES,
    )];
    let function = ManagedFunction::new(call_site as usize + 0x2000, variants, patch_points);

    let engine = MultiverseEngine::new();
    engine.load_unit(
        CompileUnit::new()
            .with_function(function.clone())
            .with_variable(variable),
    );

    assert_eq!(engine.commit_fn(function.generic_address()), 1);
    assert_eq!(function.active_variant(), None);

    let bytes = unsafe { std::slice::from_raw_parts(call_site, 5) };
    assert_eq!(bytes, &GENERIC_BYTES);
}
