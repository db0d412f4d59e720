//! Compile-time tunables for the commit engine. There is no persisted
//! configuration (§3: no persistent state) — this module just gives the
//! magic numbers §9 calls out names, instead of leaving them scattered as
//! literals.

/// Capacity of the page-protection cache (§4.1). The source hardcodes this
/// as `10`; §9 asks for it to be a named constant instead.
pub(crate) const PPC_CAPACITY: usize = 10;

/// Width, in bytes, of a single patch point. Fixed at 5 (`0xE9` + `i32`
/// displacement) by the x86_64 back end and by the data model's "byte at
/// `addr` and a byte at `addr+5`" description (§3).
pub(crate) const PATCH_WIDTH: usize = 5;
