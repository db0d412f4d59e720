use std::sync::{Arc, Mutex};

use crate::config::PATCH_WIDTH;
use crate::model::variable::{TrackedVariable, ValueRange};

/// Distinguishes a patch point reached via a `call` instruction from one
/// reached via an inlined jump sequence (§3). Both are patched identically
/// by the arch back end; the distinction only matters for how the generic
/// bytes were originally captured. `Invalid` marks a descriptor slot that
/// was never populated with a real call site; the driver skips it outright
/// (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Call,
    Jump,
    Invalid,
}

/// A single call-site rewrite target: an address plus the original
/// ("generic") bytes captured there at load time, before any variant was
/// ever applied (§3).
pub struct PatchPoint {
    kind: PatchKind,
    location: Option<usize>,
    generic_bytes: [u8; PATCH_WIDTH],
}

impl PatchPoint {
    pub fn new(kind: PatchKind, location: Option<usize>, generic_bytes: [u8; PATCH_WIDTH]) -> Self {
        Self {
            kind,
            location,
            generic_bytes,
        }
    }

    pub fn kind(&self) -> PatchKind {
        self.kind
    }

    pub fn location(&self) -> Option<usize> {
        self.location
    }

    pub fn generic_bytes(&self) -> &[u8; PATCH_WIDTH] {
        &self.generic_bytes
    }
}

/// One `tracked_variable in [lower, upper]` clause of a variant's guard
/// (§3). A variant is eligible only when every one of its assignments is
/// satisfied.
pub struct Assignment {
    variable: Arc<TrackedVariable>,
    range: ValueRange,
}

impl Assignment {
    pub fn new(variable: Arc<TrackedVariable>, range: ValueRange) -> Self {
        Self { variable, range }
    }

    pub(crate) fn variable(&self) -> &Arc<TrackedVariable> {
        &self.variable
    }

    /// # Safety
    ///
    /// The assignment's variable must still point at live memory of its
    /// declared width.
    pub(crate) unsafe fn is_satisfied(&self) -> bool {
        self.variable.satisfies(self.range)
    }
}

/// One compiled alternative body of a managed function, with the set of
/// guard conditions that make it eligible (§3).
pub struct Variant {
    address: usize,
    assignments: Vec<Assignment>,
}

impl Variant {
    pub fn new(address: usize, assignments: Vec<Assignment>) -> Self {
        Self {
            address,
            assignments,
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub(crate) fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// A variant is "good" (§4.3's `multiverse_fn_check_boundaries`) when
    /// every assignment's tracked variable is bound and its reading lies
    /// within range. A variant with zero assignments is vacuously good
    /// (the unconditional fallback case).
    ///
    /// # Safety
    ///
    /// Every assignment's variable must still point at live memory of its
    /// declared width.
    pub(crate) unsafe fn is_eligible(&self) -> bool {
        self.assignments.iter().all(|a| a.is_satisfied())
    }
}

/// A function with more than one compiled body, plus the call sites that
/// currently route into it (§3). Variants are stored in declaration order;
/// selection is last-match-wins (§4.3).
pub struct ManagedFunction {
    generic_address: usize,
    variants: Vec<Variant>,
    patch_points: Mutex<Vec<PatchPoint>>,
    active_variant: Mutex<Option<usize>>,
}

impl ManagedFunction {
    pub fn new(generic_address: usize, variants: Vec<Variant>, patch_points: Vec<PatchPoint>) -> Arc<Self> {
        Arc::new(Self {
            generic_address,
            variants,
            patch_points: Mutex::new(patch_points),
            active_variant: Mutex::new(None),
        })
    }

    pub fn generic_address(&self) -> usize {
        self.generic_address
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub(crate) fn patch_points(&self) -> std::sync::MutexGuard<'_, Vec<PatchPoint>> {
        self.patch_points.lock().unwrap()
    }

    /// Index of the variant currently patched in, if any (§3).
    pub fn active_variant(&self) -> Option<usize> {
        *self.active_variant.lock().unwrap()
    }

    pub(crate) fn set_active_variant(&self, index: Option<usize>) {
        *self.active_variant.lock().unwrap() = index;
    }

    /// Registers `self` as a referrer of every tracked variable named by its
    /// own variants' assignments, so a later write to that variable can find
    /// the functions it might affect (§3's back-reference list). Takes
    /// `self: &Arc<Self>` so it can hand out a [`Weak`] back-reference
    /// without the variable owning the function.
    pub(crate) fn register_with_variables(self: &Arc<Self>) {
        for variant in &self.variants {
            for assignment in variant.assignments() {
                assignment.variable().add_referrer(Arc::downgrade(self));
            }
        }
    }
}
