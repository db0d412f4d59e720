#![cfg(target_arch = "x86_64")]

use std::ptr;

use crate::config::PATCH_WIDTH;
use crate::engine::patch_trait::ArchBackend;
use crate::model::variant::PatchPoint;
use crate::platform;

/// `jmp rel32` opcode.
const JMP_REL_OPCODE: u8 = 0xE9;

/// x86_64 patch back end: a direct 5-byte `jmp rel32` to the target variant,
/// mirroring the near-jump case of the teacher crate's own amd64 patch back
/// end (`PatchAmd64::replace_function_with_other_function`).
pub(crate) struct Amd64Backend;

impl ArchBackend for Amd64Backend {
    unsafe fn apply(point: &PatchPoint, target_address: usize) {
        let location = point
            .location()
            .expect("apply called on a patch point without a location");

        let displacement = target_address as isize - (location as isize + PATCH_WIDTH as isize);
        let displacement = i32::try_from(displacement)
            .expect("variant target address is out of jmp rel32 range");

        let mut bytes = [0u8; PATCH_WIDTH];
        bytes[0] = JMP_REL_OPCODE;
        bytes[1..].copy_from_slice(&displacement.to_le_bytes());

        write_patch(location as *mut u8, &bytes);
    }

    unsafe fn revert(point: &PatchPoint) {
        let location = point
            .location()
            .expect("revert called on a patch point without a location");
        write_patch(location as *mut u8, point.generic_bytes());
    }
}

unsafe fn write_patch(dest: *mut u8, bytes: &[u8; PATCH_WIDTH]) {
    ptr::copy_nonoverlapping(bytes.as_ptr(), dest, PATCH_WIDTH);
    platform::clear_cache(dest, dest.add(PATCH_WIDTH));
}
