//! Shim module to abstract over std and loom primitives.
//!
//! Everything that synchronizes goes through here, so `--features loom` swaps the
//! whole crate onto loom's model-checked `Mutex`, `Condvar`, `Arc` and atomics.

#[cfg(not(feature = "loom"))]
pub mod atomic {
    pub use std::sync::atomic::*;
}

#[cfg(feature = "loom")]
pub mod atomic {
    pub use loom::sync::atomic::*;
}

#[cfg(not(feature = "loom"))]
pub mod sync {
    pub use std::sync::{Arc, Condvar, Mutex, MutexGuard};
}

#[cfg(feature = "loom")]
pub mod sync {
    pub use loom::sync::{Arc, Condvar, Mutex, MutexGuard};
}

use std::sync::PoisonError;

use self::sync::{Condvar, Mutex, MutexGuard};

/// Lock `mutex`, recovering the guard if a previous holder panicked.
///
/// Guarded state is only mutated by crate code that cannot panic halfway
/// through an update; user code under a lock only ever reads. A poisoned lock
/// therefore still protects consistent state.
///
/// 加锁并在锁中毒时恢复 guard。受保护的状态只由不会中途 panic 的 crate 代码修改，
/// 持锁期间的用户代码只读，因此中毒的锁仍保护一致的状态。
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Block on `condvar`, releasing `guard` while suspended.
///
/// Callers must re-check their predicate afterwards; a return does not imply it holds.
#[inline]
pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

/// Block on `condvar` for at most `timeout`.
///
/// Returns the re-acquired guard and whether the wait ran out of time.
#[cfg(not(feature = "loom"))]
#[inline]
pub(crate) fn wait_timeout<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: std::time::Duration,
) -> (MutexGuard<'a, T>, bool) {
    let (guard, result) = condvar
        .wait_timeout(guard, timeout)
        .unwrap_or_else(PoisonError::into_inner);
    (guard, result.timed_out())
}
