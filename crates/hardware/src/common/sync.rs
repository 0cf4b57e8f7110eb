//! Lock helpers.
//!
//! Cores, caches, and the coherency controller share state through `Mutex`es. A
//! poisoned lock only means another core panicked mid-update; the guarded data is a
//! plain value store, so the guard is recovered instead of propagating the panic.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard if the lock is poisoned.
#[inline]
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
