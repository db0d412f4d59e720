use crate::model::variant::PatchPoint;

/// Architecture back end (§6: `arch_apply` / `arch_revert`). Encodings are
/// opaque to the rest of the engine; the only contract the engine relies on
/// is that both operations stay within the patch point's fixed width so that
/// `location` and `location + PATCH_WIDTH` remain the only two bytes the PPC
/// needs to have unprotected.
pub(crate) trait ArchBackend {
    /// Rewrites `point` so that it transfers control to `target_address`.
    ///
    /// # Safety
    ///
    /// `point.location` must be `Some` and point at writable, executable
    /// memory (the caller is expected to have unprotected it already).
    unsafe fn apply(point: &PatchPoint, target_address: usize);

    /// Restores `point` to its generic (pre-patch) form.
    ///
    /// # Safety
    ///
    /// Same requirement as [`ArchBackend::apply`].
    unsafe fn revert(point: &PatchPoint);
}
