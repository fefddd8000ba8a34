//! Shared state and error types for the one-shot channel.
//!
//! 一次性通道的共享状态与错误类型。

use std::fmt;

use crate::counter::SharedCounter;
use crate::shim::sync::{Condvar, Mutex, MutexGuard};
use crate::shim::{lock, wait};

// ============================================================================
// Error Types
// ============================================================================

pub mod error {
    //! Oneshot error types.

    use thiserror::Error;

    /// Error returned when a value has already been committed to the channel
    ///
    /// The rejected value is dropped; the committed one is left untouched.
    ///
    /// 当通道已被提交过值时返回的错误。被拒绝的值会被丢弃，已提交的值保持不变。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error("channel already committed")]
    pub struct AlreadyCommitted;

    /// Error returned from `try_wait` when nothing has been committed yet
    ///
    /// 尚未提交任何值时 `try_wait` 返回的错误
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum TryWaitError {
        /// No commit has happened yet
        ///
        /// 尚未提交
        #[error("channel not committed yet")]
        Pending,
    }

    /// Error returned from `wait_timeout` when the deadline passes first
    ///
    /// 截止时间先到达时 `wait_timeout` 返回的错误
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum WaitTimeoutError {
        /// The timeout elapsed before a commit
        ///
        /// 在提交之前超时
        #[error("timed out waiting for commit")]
        Timeout,
    }
}

pub use self::error::{AlreadyCommitted, TryWaitError, WaitTimeoutError};

// ============================================================================
// Inner State
// ============================================================================

pub(crate) struct Slot<T> {
    pub(crate) value: Option<T>,
    pub(crate) committed: bool,
}

/// State shared by every committer and waiter of one channel
pub(crate) struct Inner<T> {
    slot: Mutex<Slot<T>>,
    committed: Condvar,
    rejected: SharedCounter,
}

impl<T> Inner<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                committed: false,
            }),
            committed: Condvar::new(),
            rejected: SharedCounter::atomic(),
        }
    }

    /// Store `value` and flip `committed`, at most once per channel
    pub(crate) fn commit(&self, value: Option<T>) -> Result<(), AlreadyCommitted> {
        let mut slot = lock(&self.slot);
        if slot.committed {
            drop(slot);
            self.rejected.increment();
            log::debug!("rejected commit on an already committed oneshot channel");
            // The losing value is dropped outside the lock.
            drop(value);
            return Err(AlreadyCommitted);
        }

        slot.value = value;
        slot.committed = true;
        drop(slot);

        self.committed.notify_all();
        Ok(())
    }

    /// Block until committed and return the locked slot
    pub(crate) fn wait_committed(&self) -> MutexGuard<'_, Slot<T>> {
        let mut slot = lock(&self.slot);
        while !slot.committed {
            slot = wait(&self.committed, slot);
        }
        slot
    }

    /// Like `wait_committed`, but gives up after `timeout`
    #[cfg(not(feature = "loom"))]
    pub(crate) fn wait_committed_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Option<MutexGuard<'_, Slot<T>>> {
        use std::time::Instant;

        let deadline = Instant::now().checked_add(timeout);
        let mut slot = lock(&self.slot);
        while !slot.committed {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                // Too far in the future to represent.
                None => {
                    slot = wait(&self.committed, slot);
                    continue;
                }
            };
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = crate::shim::wait_timeout(&self.committed, slot, remaining);
            slot = guard;
        }
        Some(slot)
    }

    /// Lock the slot without waiting
    pub(crate) fn peek(&self) -> MutexGuard<'_, Slot<T>> {
        lock(&self.slot)
    }

    pub(crate) fn is_committed(&self) -> bool {
        lock(&self.slot).committed
    }

    pub(crate) fn rejected_commits(&self) -> usize {
        self.rejected.load()
    }
}

impl<T> fmt::Debug for Inner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("committed", &self.is_committed())
            .finish_non_exhaustive()
    }
}
