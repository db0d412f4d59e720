//! Variant Selector (§4.3): decides which variant, if any, a managed
//! function should be running right now.

use crate::model::variant::ManagedFunction;

/// Picks the variant a function should be running: the *last* one (in
/// declaration order) whose guard is fully satisfied, matching the source's
/// `__multiverse_commit_fn` loop rather than a first-match or
/// best-match policy (§4.3).
///
/// Returns `None` when no variant is eligible, meaning the function should
/// run its generic body.
///
/// # Safety
///
/// Every tracked variable referenced by `function`'s variants must still
/// point at live memory of its declared width.
pub(crate) unsafe fn select(function: &ManagedFunction) -> Option<usize> {
    function
        .variants()
        .iter()
        .enumerate()
        .filter(|(_, variant)| variant.is_eligible())
        .map(|(index, _)| index)
        .last()
}
