//! End-to-end: a function with three variants, last-match-wins selection,
//! and re-selection as the tracked variable's value changes.

use multiverse_commit::{
    Assignment, CompileUnit, ManagedFunction, MultiverseEngine, PatchKind, PatchPoint,
    TrackedVariable, ValueRange, Variant, VarWidth,
};
use std::sync::Arc;

const JMP_REL_OPCODE: u8 = 0xE9;
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

fn displacement_at(page: *mut u8) -> i32 {
    let bytes = unsafe { std::slice::from_raw_parts(page, 5) };
    assert_eq!(bytes[0], JMP_REL_OPCODE, "call site was not patched");
    i32::from_le_bytes(bytes[1..5].try_into().unwrap())
}

#[test]
fn last_eligible_variant_wins_and_tracks_changes() {
    let call_site = map_executable_page();
    unsafe { std::ptr::copy_nonoverlapping(GENERIC_BYTES.as_ptr(), call_site, 5) };

    let variant_low = map_executable_page() as usize;
    let variant_mid = map_executable_page() as usize;
    let variant_high = map_executable_page() as usize;

    let speed_storage = Box::leak(Box::new(0u32));
    let speed = Arc::new(TrackedVariable::new(
        speed_storage as *mut u32 as usize,
        VarWidth::Four,
        true,
    ));

    let variants = vec![
        Variant::new(
            variant_low,
            vec![Assignment::new(speed.clone(), ValueRange::new(0, 10))],
        ),
        Variant::new(
            variant_mid,
            vec![Assignment::new(speed.clone(), ValueRange::new(0, 50))],
        ),
        Variant::new(
            variant_high,
            vec![Assignment::new(speed.clone(), ValueRange::new(40, 100))],
        ),
    ];
    let patch_points = vec![PatchPoint::new(
        PatchKind::Call,
        Some(call_site as usize),
        GENERIC_BYTES,
    )];
    let function = ManagedFunction::new(call_site as usize + 0x1000, variants, patch_points);

    let engine = MultiverseEngine::new();
    engine.load_unit(
        CompileUnit::new()
            .with_function(function.clone())
            .with_variable(speed.clone()),
    );

    engine.bind(speed.address(), 1);
    *speed_storage = 5;
    assert_eq!(engine.commit_fn(function.generic_address()), 1);
    assert_eq!(function.active_variant(), Some(0));
    let expected = variant_low as isize - (call_site as isize + 5);
    assert_eq!(displacement_at(call_site) as isize, expected);

    *speed_storage = 45;
    assert_eq!(engine.commit_fn(function.generic_address()), 1);
    assert_eq!(function.active_variant(), Some(2));
    let expected = variant_high as isize - (call_site as isize + 5);
    assert_eq!(displacement_at(call_site) as isize, expected);

    *speed_storage = 20;
    assert_eq!(engine.commit_fn(function.generic_address()), 1);
    assert_eq!(function.active_variant(), Some(1));
    let expected = variant_mid as isize - (call_site as isize + 5);
    assert_eq!(displacement_at(call_site) as isize, expected);
}
