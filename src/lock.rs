use std::sync::{Mutex, MutexGuard};

/// A [`Mutex`] that never stays poisoned. A panic inside one commit or
/// revert call must not permanently wedge every later call from the same
/// engine; we only need mutual exclusion between callers, not poisoning
/// semantics (mirrors the teacher crate's own mutex wrapper of the same
/// shape, `NoPoisonMutex`).
pub(crate) struct NoPoisonMutex<T> {
    inner: Mutex<T>,
}

impl<T> NoPoisonMutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
