//! Commit engine for runtime function multi-versioning.
//!
//! A managed function can have more than one compiled body ("variant"),
//! each valid only while a set of tracked program variables stay within
//! declared ranges. This crate owns the runtime half of that scheme: given
//! the current values of those variables, decide which variant (if any) a
//! function should be running, and rewrite its call sites in place to reach
//! it — a direct `jmp rel32` patched over the original instruction, with
//! the page permission flips needed to write executable memory batched
//! across nearby patch points.
//!
//! [`MultiverseEngine`] is the owned entry point: build one, load one or
//! more [`CompileUnit`]s into it, then call its `commit_*`/`revert_*`
//! methods as tracked variables change. [`global`] exposes the same
//! operations as free functions over a lazily constructed process-wide
//! engine, for callers expecting the traditional single registry.

mod api;
mod config;
mod engine;
mod lock;
mod model;
mod platform;

pub use api::global;
pub use api::MultiverseEngine;
pub use engine::error::CommitError;
pub use model::registry::CompileUnit;
pub use model::variable::{TrackedVariable, ValueRange, VarWidth};
pub use model::variant::{Assignment, ManagedFunction, PatchKind, PatchPoint, Variant};
