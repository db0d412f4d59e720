use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use crate::model::variant::ManagedFunction;
use std::sync::Weak;

/// Width of a tracked variable, restricted to 1, 2 or 4 bytes (§3). Any other
/// width is a malformed descriptor and, per §7, fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarWidth {
    One,
    Two,
    Four,
}

impl VarWidth {
    /// Builds a [`VarWidth`] from a byte count.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not 1, 2 or 4 — the descriptor would be
    /// malformed and the source treats this as unrecoverable
    /// (`assert(0 && "Invalid width ...")`, §7).
    pub fn from_bytes(bytes: usize) -> Self {
        match bytes {
            1 => VarWidth::One,
            2 => VarWidth::Two,
            4 => VarWidth::Four,
            other => panic!(
                "invalid tracked-variable width {other} bytes; must be 1, 2, or 4"
            ),
        }
    }
}

/// A closed interval `[lower, upper]` an [`super::variant::Assignment`]
/// compares a tracked variable's reading against, unsigned (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub lower: u32,
    pub upper: u32,
}

impl ValueRange {
    pub fn new(lower: u32, upper: u32) -> Self {
        Self { lower, upper }
    }

    fn contains(&self, value: u32) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// A program variable whose value gates variant selection (§3). Created once
/// at load, mutated only through [`TrackedVariable::bind`].
pub struct TrackedVariable {
    address: usize,
    width: VarWidth,
    tracked: bool,
    bound: AtomicI32,
    referrers: Mutex<Vec<Weak<ManagedFunction>>>,
}

impl TrackedVariable {
    pub fn new(address: usize, width: VarWidth, tracked: bool) -> Self {
        Self {
            address,
            width,
            tracked,
            bound: AtomicI32::new(0),
            referrers: Mutex::new(Vec::new()),
        }
    }

    /// Builds a [`TrackedVariable`] from a raw descriptor, the shape a
    /// compiled-in variable table actually arrives in: an address and a
    /// width given in bytes rather than as an already-validated
    /// [`VarWidth`].
    ///
    /// # Panics
    ///
    /// Panics if `width_bytes` is not 1, 2, or 4 (see [`VarWidth::from_bytes`]).
    pub fn from_descriptor(address: usize, width_bytes: usize, tracked: bool) -> Self {
        Self::new(address, VarWidth::from_bytes(width_bytes), tracked)
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn tracked(&self) -> bool {
        self.tracked
    }

    pub fn bound_state(&self) -> i32 {
        self.bound.load(Ordering::SeqCst)
    }

    fn is_bound(&self) -> bool {
        self.bound_state() != 0
    }

    /// Sets the bound state when `state >= 0`; fails if the variable was not
    /// declared tracked (§4.4, §7). Returns the post-call bound value.
    pub fn bind(&self, state: i32) -> Result<i32, crate::engine::error::CommitError> {
        if state >= 0 {
            if !self.tracked {
                return Err(crate::engine::error::CommitError::NotTracked);
            }
            self.bound.store(state, Ordering::SeqCst);
        }
        Ok(self.bound_state())
    }

    /// Reads the variable's current value as an unsigned integer of its
    /// declared width (§4.2).
    ///
    /// # Safety
    ///
    /// The variable's address must still point at live, readable memory of
    /// at least its declared width.
    unsafe fn read_value(&self) -> u32 {
        match self.width {
            VarWidth::One => *(self.address as *const u8) as u32,
            VarWidth::Two => *(self.address as *const u16) as u32,
            VarWidth::Four => *(self.address as *const u32),
        }
    }

    /// True if `self` is bound and its current reading lies in `range`.
    ///
    /// # Safety
    ///
    /// Same as [`TrackedVariable::read_value`].
    pub(crate) unsafe fn satisfies(&self, range: ValueRange) -> bool {
        self.is_bound() && range.contains(self.read_value())
    }

    pub(crate) fn add_referrer(&self, function: Weak<ManagedFunction>) {
        self.referrers.lock().unwrap().push(function);
    }

    /// Every still-live managed function whose variants mention this
    /// variable (§3's "back-reference list").
    pub(crate) fn referrers(&self) -> Vec<std::sync::Arc<ManagedFunction>> {
        self.referrers
            .lock()
            .unwrap()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}
