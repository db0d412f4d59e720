//! Commit Driver (§4.4): the only place that actually walks managed
//! functions and rewrites patch points, with the page-protection cache
//! batched across every function a single call touches.

use std::sync::Arc;

use crate::config::PATCH_WIDTH;
use crate::engine::error::CommitError;
use crate::engine::patch_trait::ArchBackend;
use crate::engine::ppc::PageCache;
use crate::engine::selector;
use crate::model::registry::InfoSet;
use crate::model::variant::{ManagedFunction, PatchKind};

#[cfg(target_arch = "x86_64")]
use crate::engine::patch_amd64::Amd64Backend as Backend;

#[cfg(not(target_arch = "x86_64"))]
compile_error!("the commit engine ships a concrete patch back end for x86_64 only");

/// Brings one function's patched call sites in line with whatever the
/// variant selector currently picks, mutating `ppc` as needed. A no-op if
/// the selector's choice already matches the function's active variant
/// (§4.3's `mvfn == fn->extra->active_mvfn` short circuit).
///
/// # Safety
///
/// Every tracked variable referenced by `function`'s variants must still
/// point at live memory of its declared width, and every patch point's
/// location (if set) must point at writable-once-unprotected, executable
/// memory belonging to this process.
pub(crate) unsafe fn commit_function(function: &ManagedFunction, ppc: &mut PageCache) -> Result<(), CommitError> {
    let chosen = selector::select(function);
    if chosen == function.active_variant() {
        return Ok(());
    }

    let points = function.patch_points();
    for point in points.iter() {
        if point.kind() == PatchKind::Invalid {
            continue;
        }
        if let Some(location) = point.location() {
            ppc.unprotect(location);
            ppc.unprotect(location + PATCH_WIDTH);

            match chosen {
                Some(index) => {
                    let target = function.variants()[index].address();
                    Backend::apply(point, target);
                }
                None => Backend::revert(point),
            }
        }
    }
    drop(points);

    function.set_active_variant(chosen);
    Ok(())
}

/// Reverts one function to its generic body, regardless of what the
/// selector would currently choose (§4.4's `revert_*` family).
///
/// # Safety
///
/// Same requirements as [`commit_function`].
pub(crate) unsafe fn revert_function(function: &ManagedFunction, ppc: &mut PageCache) -> Result<(), CommitError> {
    if function.active_variant().is_none() {
        return Ok(());
    }

    let points = function.patch_points();
    for point in points.iter() {
        if point.kind() == PatchKind::Invalid {
            continue;
        }
        if let Some(location) = point.location() {
            ppc.unprotect(location);
            ppc.unprotect(location + PATCH_WIDTH);
            Backend::revert(point);
        }
    }
    drop(points);

    function.set_active_variant(None);
    Ok(())
}

/// Runs `op` over every function in `functions` inside a single
/// page-protection batch, stopping at the first failure but still closing
/// the cache (re-protecting every page it touched) before returning (§4.4,
/// §5). Mirrors the source's `// FIXME: get a valid state after this`
/// comment: functions committed before the failing one stay committed.
fn run_batch(
    functions: impl Iterator<Item = Arc<ManagedFunction>>,
    op: unsafe fn(&ManagedFunction, &mut PageCache) -> Result<(), CommitError>,
) -> Result<usize, CommitError> {
    let mut ppc = PageCache::open()?;
    let mut succeeded = 0;
    let mut failure = None;

    for function in functions {
        match unsafe { op(&function, &mut ppc) } {
            Ok(()) => succeeded += 1,
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    ppc.close();

    match failure {
        Some(err) => Err(err),
        None => Ok(succeeded),
    }
}

/// Commits an already-resolved function handle directly, skipping the
/// address lookup (§4.4 `multiverse_commit_info_fn`).
pub(crate) fn commit_one_info(function: Arc<ManagedFunction>) -> Result<usize, CommitError> {
    run_batch(std::iter::once(function), commit_function)
}

/// Commits every function in `functions` directly, skipping the address
/// lookup (§4.4 `multiverse_commit_info_refs`).
pub(crate) fn commit_many_info(functions: Vec<Arc<ManagedFunction>>) -> Result<usize, CommitError> {
    run_batch(functions.into_iter(), commit_function)
}

/// Commits a single function looked up by its generic address (§4.4
/// `multiverse_commit_fn`).
pub(crate) fn commit_one(infoset: &InfoSet, address: usize) -> Result<usize, CommitError> {
    let function = infoset
        .function_at(address)
        .ok_or(CommitError::FunctionNotFound(address))?
        .clone();
    run_batch(std::iter::once(function), commit_function)
}

/// Reverts a single function looked up by its generic address (§4.4
/// `multiverse_revert_fn`).
pub(crate) fn revert_one(infoset: &InfoSet, address: usize) -> Result<usize, CommitError> {
    let function = infoset
        .function_at(address)
        .ok_or(CommitError::FunctionNotFound(address))?
        .clone();
    run_batch(std::iter::once(function), revert_function)
}

/// Reverts an already-resolved function handle directly, skipping the
/// address lookup (§4.4 `multiverse_revert_info_fn`).
pub(crate) fn revert_one_info(function: Arc<ManagedFunction>) -> Result<usize, CommitError> {
    run_batch(std::iter::once(function), revert_function)
}

/// Reverts every function in `functions` directly, skipping the address
/// lookup (§4.4 `multiverse_revert_info_refs`).
pub(crate) fn revert_many_info(functions: Vec<Arc<ManagedFunction>>) -> Result<usize, CommitError> {
    run_batch(functions.into_iter(), revert_function)
}

/// Commits every function that references the tracked variable at
/// `address` (§4.4 `multiverse_commit_refs`).
pub(crate) fn commit_refs(infoset: &InfoSet, address: usize) -> Result<usize, CommitError> {
    if infoset.variable_at(address).is_none() {
        return Err(CommitError::VariableNotFound(address));
    }
    let functions = infoset.functions_referencing(address);
    run_batch(functions.into_iter(), commit_function)
}

/// Reverts every function that references the tracked variable at
/// `address` (§4.4 `multiverse_revert_refs`).
pub(crate) fn revert_refs(infoset: &InfoSet, address: usize) -> Result<usize, CommitError> {
    if infoset.variable_at(address).is_none() {
        return Err(CommitError::VariableNotFound(address));
    }
    let functions = infoset.functions_referencing(address);
    run_batch(functions.into_iter(), revert_function)
}

/// Commits every managed function known to the whole program (§4.4
/// `multiverse_commit`).
pub(crate) fn commit_all(infoset: &InfoSet) -> Result<usize, CommitError> {
    let functions: Vec<_> = infoset.all_functions().cloned().collect();
    run_batch(functions.into_iter(), commit_function)
}

/// Reverts every managed function known to the whole program (§4.4
/// `multiverse_revert`).
pub(crate) fn revert_all(infoset: &InfoSet) -> Result<usize, CommitError> {
    let functions: Vec<_> = infoset.all_functions().cloned().collect();
    run_batch(functions.into_iter(), revert_function)
}
