//! Public surface (§6): an owned, testable engine plus a process-global
//! singleton exposing the same operations under the source's entry-point
//! names, for callers that expect a process-scope registry (§9).

use std::sync::Arc;

use crate::engine::driver;
use crate::engine::error::CommitError;
use crate::lock::NoPoisonMutex;
use crate::model::registry::{CompileUnit, InfoSet};
use crate::model::variable::TrackedVariable;
use crate::model::variant::ManagedFunction;

/// An independent commit engine: a whole-program [`InfoSet`] plus the
/// single process-wide lock that serializes every commit/revert batch
/// against it (§5). Each instance is fully isolated from every other, which
/// is what lets tests build one apiece instead of sharing global state.
pub struct MultiverseEngine {
    infoset: NoPoisonMutex<InfoSet>,
}

impl MultiverseEngine {
    pub fn new() -> Self {
        Self {
            infoset: NoPoisonMutex::new(InfoSet::new()),
        }
    }

    /// Adds a compiled unit's functions and variables to the whole-program
    /// registry (§3). Units accumulate; there is no way to remove one.
    pub fn load_unit(&self, unit: CompileUnit) {
        self.infoset.lock().add_unit(unit);
    }

    /// Commits the function at `address` to its best-matching variant
    /// (`multiverse_commit_fn`). Returns `-1` on a recoverable failure
    /// (§4.4, §7).
    pub fn commit_fn(&self, address: usize) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::commit_one(&infoset, address))
    }

    /// Commits an already-resolved function handle directly, skipping the
    /// address lookup `commit_fn` performs (`multiverse_commit_info_fn`).
    pub fn commit_info_fn(&self, function: &Arc<ManagedFunction>) -> i32 {
        let _infoset = self.infoset.lock();
        to_c_result(driver::commit_one_info(function.clone()))
    }

    /// Commits every function that references the tracked variable at
    /// `address` (`multiverse_commit_refs`).
    pub fn commit_refs(&self, address: usize) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::commit_refs(&infoset, address))
    }

    /// Commits every function referencing `variable` directly, skipping
    /// the address lookup (`multiverse_commit_info_refs`).
    pub fn commit_info_refs(&self, variable: &Arc<TrackedVariable>) -> i32 {
        let _infoset = self.infoset.lock();
        to_c_result(driver::commit_many_info(variable.referrers()))
    }

    /// Commits every managed function known to this engine
    /// (`multiverse_commit`).
    pub fn commit_all(&self) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::commit_all(&infoset))
    }

    /// Reverts the function at `address` to its generic body
    /// (`multiverse_revert_fn`).
    pub fn revert_fn(&self, address: usize) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::revert_one(&infoset, address))
    }

    /// Reverts an already-resolved function handle directly, skipping the
    /// address lookup `revert_fn` performs (`multiverse_revert_info_fn`).
    pub fn revert_info_fn(&self, function: &Arc<ManagedFunction>) -> i32 {
        let _infoset = self.infoset.lock();
        to_c_result(driver::revert_one_info(function.clone()))
    }

    /// Reverts every function that references the tracked variable at
    /// `address` (`multiverse_revert_refs`).
    pub fn revert_refs(&self, address: usize) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::revert_refs(&infoset, address))
    }

    /// Reverts every function referencing `variable` directly, skipping
    /// the address lookup (`multiverse_revert_info_refs`).
    pub fn revert_info_refs(&self, variable: &Arc<TrackedVariable>) -> i32 {
        let _infoset = self.infoset.lock();
        to_c_result(driver::revert_many_info(variable.referrers()))
    }

    /// Reverts every managed function known to this engine
    /// (`multiverse_revert`).
    pub fn revert_all(&self) -> i32 {
        let infoset = self.infoset.lock();
        to_c_result(driver::revert_all(&infoset))
    }

    /// True if the function at `address` currently has a variant patched in
    /// (`multiverse_is_committed`). A lookup miss reads as "not committed"
    /// rather than an error (§11's open-question resolution).
    pub fn is_committed(&self, address: usize) -> bool {
        let infoset = self.infoset.lock();
        infoset
            .function_at(address)
            .is_some_and(|function| function.active_variant().is_some())
    }

    /// Binds the tracked variable at `address` to `state`
    /// (`multiverse_bind`). Returns `-1` if the address is unknown or the
    /// variable was never declared tracked.
    pub fn bind(&self, address: usize, state: i32) -> i32 {
        let infoset = self.infoset.lock();
        let variable = match infoset.variable_at(address) {
            Some(variable) => variable,
            None => return -1,
        };
        match variable.bind(state) {
            Ok(value) => value,
            Err(_) => -1,
        }
    }
}

impl Default for MultiverseEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn to_c_result(result: Result<usize, CommitError>) -> i32 {
    match result {
        Ok(count) => count as i32,
        Err(err) => {
            log::warn!("commit engine operation failed: {err}");
            -1
        }
    }
}

/// Process-global registry (§9): the default engine every free function in
/// [`crate::global`] operates on, for callers that want the source's
/// literal `multiverse_*` entry points rather than an owned [`MultiverseEngine`].
pub mod global {
    use std::sync::OnceLock;

    use super::MultiverseEngine;

    static ENGINE: OnceLock<MultiverseEngine> = OnceLock::new();

    fn engine() -> &'static MultiverseEngine {
        ENGINE.get_or_init(MultiverseEngine::new)
    }

    pub fn multiverse_commit_fn(address: usize) -> i32 {
        engine().commit_fn(address)
    }

    pub fn multiverse_commit_refs(address: usize) -> i32 {
        engine().commit_refs(address)
    }

    pub fn multiverse_commit() -> i32 {
        engine().commit_all()
    }

    pub fn multiverse_revert_fn(address: usize) -> i32 {
        engine().revert_fn(address)
    }

    pub fn multiverse_revert_refs(address: usize) -> i32 {
        engine().revert_refs(address)
    }

    pub fn multiverse_revert() -> i32 {
        engine().revert_all()
    }

    pub fn multiverse_is_committed(address: usize) -> bool {
        engine().is_committed(address)
    }

    pub fn multiverse_bind(address: usize, state: i32) -> i32 {
        engine().bind(address, state)
    }
}
