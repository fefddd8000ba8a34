//! One-shot cross-thread signaling channel
//!
//! A [`Committer`] stores a value (or emptiness) exactly once; every [`Waiter`]
//! can block until that happens and then observe the committed value.
//!
//! 一次性跨线程信号通道。[`Committer`] 只能提交一次值（或空值）；
//! 所有 [`Waiter`] 都可以阻塞直到提交发生，然后读取已提交的值。
//!
//! # Semantics | 语义
//!
//! - The first successful [`Committer::commit`] wins. Later commits, from any
//!   clone of the committer, return [`AlreadyCommitted`] and drop their value.
//! - [`Waiter::wait`] suspends on a condition variable and is woken by the
//!   commit; it never polls. Once committed, it returns immediately.
//! - If every committer is dropped without committing, [`Waiter::wait`] blocks
//!   forever. Use [`Waiter::wait_timeout`] when a bounded wait is needed.
//!
//! - 第一次成功的 [`Committer::commit`] 生效，之后的提交返回 [`AlreadyCommitted`] 并丢弃其值。
//! - [`Waiter::wait`] 在条件变量上挂起，由提交唤醒，从不轮询。
//! - 若所有提交者都未提交就被丢弃，[`Waiter::wait`] 将永远阻塞；需要有界等待时使用 [`Waiter::wait_timeout`]。
//!
//! # Example
//!
//! ```
//! use lite_thread::oneshot;
//!
//! let (committer, waiter) = oneshot::channel::<String>();
//!
//! let producer = std::thread::spawn(move || {
//!     committer.set("Hello World!".to_string()).unwrap();
//! });
//!
//! assert_eq!(waiter.wait().as_deref(), Some("Hello World!"));
//! producer.join().unwrap();
//! ```

pub mod common;
pub mod packaged;

use std::fmt;

use crate::shim::sync::Arc;
use self::common::Inner;

pub use self::common::error;
pub use self::common::{AlreadyCommitted, TryWaitError, WaitTimeoutError};
pub use self::packaged::packaged;

/// Create a connected committer/waiter pair
///
/// 创建一对相连的提交者与等待者
#[inline]
pub fn channel<T>() -> (Committer<T>, Waiter<T>) {
    let inner = Arc::new(Inner::new());
    (
        Committer {
            inner: Arc::clone(&inner),
        },
        Waiter { inner },
    )
}

// ============================================================================
// Committer
// ============================================================================

/// Writing half of a one-shot channel
///
/// Clones share the same slot; at most one commit across all of them succeeds.
///
/// 一次性通道的写入端。克隆共享同一个槽位，所有克隆中最多只有一次提交成功。
pub struct Committer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Committer<T> {
    /// Commit `value` (or emptiness with `None`) and wake every waiter
    ///
    /// Returns [`AlreadyCommitted`] if the channel was committed before; the
    /// stored value is never overwritten.
    ///
    /// 提交 `value`（`None` 表示空值）并唤醒所有等待者。
    /// 若通道之前已提交则返回 [`AlreadyCommitted`]，已存储的值不会被覆盖。
    #[inline]
    pub fn commit(&self, value: Option<T>) -> Result<(), AlreadyCommitted> {
        self.inner.commit(value)
    }

    /// Commit a value
    #[inline]
    pub fn set(&self, value: T) -> Result<(), AlreadyCommitted> {
        self.commit(Some(value))
    }

    /// Commit emptiness
    #[inline]
    pub fn set_empty(&self) -> Result<(), AlreadyCommitted> {
        self.commit(None)
    }

    #[inline]
    pub fn is_committed(&self) -> bool {
        self.inner.is_committed()
    }

    /// Number of commits rejected because the channel was already committed
    ///
    /// 因通道已提交而被拒绝的提交次数
    #[inline]
    pub fn rejected_commits(&self) -> usize {
        self.inner.rejected_commits()
    }

    /// Create a new waiter attached to this channel
    #[inline]
    pub fn waiter(&self) -> Waiter<T> {
        Waiter {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Clone for Committer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Committer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Committer").finish_non_exhaustive()
    }
}

// ============================================================================
// Waiter
// ============================================================================

/// Reading half of a one-shot channel
///
/// Waiters only observe; cloning one adds another observer of the same slot.
///
/// 一次性通道的读取端。等待者只观察，克隆会增加同一槽位的另一个观察者。
pub struct Waiter<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Waiter<T> {
    /// Block until committed, then lend the stored value to `f`
    ///
    /// `f` runs while the channel's lock is held and must not touch this
    /// channel. Useful for values that are not `Clone`.
    ///
    /// 阻塞直到提交，然后将存储的值借给 `f`。`f` 在持锁期间执行，不得再访问此通道。
    pub fn wait_with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(Option<&T>) -> R,
    {
        let slot = self.inner.wait_committed();
        f(slot.value.as_ref())
    }

    #[inline]
    pub fn is_committed(&self) -> bool {
        self.inner.is_committed()
    }
}

impl<T: Clone> Waiter<T> {
    /// Block until committed and return a copy of the committed value
    ///
    /// Returns immediately if the channel is already committed.
    ///
    /// 阻塞直到提交并返回已提交值的副本。若已提交则立即返回。
    pub fn wait(&self) -> Option<T> {
        self.inner.wait_committed().value.clone()
    }

    /// Return the committed value without blocking
    ///
    /// 非阻塞地返回已提交的值
    pub fn try_wait(&self) -> Result<Option<T>, TryWaitError> {
        let slot = self.inner.peek();
        if slot.committed {
            Ok(slot.value.clone())
        } else {
            Err(TryWaitError::Pending)
        }
    }

    /// Block for at most `timeout`
    ///
    /// On timeout the channel state is left unchanged.
    ///
    /// 最多阻塞 `timeout`。超时不会改变通道状态。
    #[cfg(not(feature = "loom"))]
    pub fn wait_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Option<T>, WaitTimeoutError> {
        match self.inner.wait_committed_timeout(timeout) {
            Some(slot) => Ok(slot.value.clone()),
            None => Err(WaitTimeoutError::Timeout),
        }
    }
}

impl<T> Clone for Waiter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Waiter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("committed", &self.is_committed())
            .finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_commit_then_wait() {
        let (committer, waiter) = channel::<i32>();

        committer.set(42).unwrap();

        assert!(waiter.is_committed());
        assert_eq!(waiter.wait(), Some(42));
        // Waiting again observes the same value.
        assert_eq!(waiter.wait(), Some(42));
    }

    #[test]
    fn test_commit_empty() {
        let (committer, waiter) = channel::<String>();

        committer.set_empty().unwrap();

        assert_eq!(waiter.wait(), None);
        assert_eq!(waiter.try_wait(), Ok(None));
    }

    #[test]
    fn test_second_commit_rejected() {
        let (committer, waiter) = channel::<&str>();

        committer.set("first").unwrap();
        assert_eq!(committer.set("second"), Err(AlreadyCommitted));
        assert_eq!(committer.set_empty(), Err(AlreadyCommitted));

        assert_eq!(waiter.wait(), Some("first"));
        assert_eq!(committer.rejected_commits(), 2);
    }

    #[test]
    fn test_try_wait_pending() {
        let (committer, waiter) = channel::<u8>();

        assert_eq!(waiter.try_wait(), Err(TryWaitError::Pending));
        // try_wait never commits on its own
        assert!(!committer.is_committed());

        committer.set(7).unwrap();
        assert_eq!(waiter.try_wait(), Ok(Some(7)));
    }

    #[test]
    fn test_wait_blocks_until_commit() {
        let (committer, waiter) = channel::<&'static str>();
        let delay = Duration::from_millis(50);

        let producer = thread::spawn(move || {
            thread::sleep(delay);
            committer.set("Hello World!").unwrap();
        });

        let start = Instant::now();
        assert_eq!(waiter.wait(), Some("Hello World!"));
        assert!(start.elapsed() >= delay);

        producer.join().unwrap();
    }

    #[test]
    fn test_concurrent_commits_single_winner() {
        const N: usize = 16;

        let (committer, waiter) = channel::<usize>();
        let barrier = Arc::new(Barrier::new(N));

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let committer = committer.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    committer.set(i).is_ok().then_some(i)
                })
            })
            .collect();

        let winners: Vec<usize> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(waiter.wait(), Some(winners[0]));
        assert_eq!(committer.rejected_commits(), N - 1);
    }

    #[test]
    fn test_many_waiters_all_woken() {
        let (committer, waiter) = channel::<u64>();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let waiter = waiter.clone();
                thread::spawn(move || waiter.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        committer.set(99).unwrap();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(99));
        }
    }

    #[test]
    fn test_wait_timeout_then_commit() {
        let (committer, waiter) = channel::<i32>();

        assert_eq!(
            waiter.wait_timeout(Duration::from_millis(20)),
            Err(WaitTimeoutError::Timeout)
        );
        // A timeout leaves the channel committable.
        assert!(!waiter.is_committed());

        committer.set(3).unwrap();
        assert_eq!(waiter.wait_timeout(Duration::from_millis(20)), Ok(Some(3)));
    }

    #[test]
    fn test_wait_timeout_dropped_committer() {
        let (committer, waiter) = channel::<i32>();
        drop(committer);

        let start = Instant::now();
        assert_eq!(
            waiter.wait_timeout(Duration::from_millis(30)),
            Err(WaitTimeoutError::Timeout)
        );
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_with_non_clone_value() {
        struct Token(u32);

        let (committer, waiter) = channel::<Token>();
        committer.set(Token(5)).unwrap();

        let seen = waiter.wait_with(|token| token.map(|t| t.0));
        assert_eq!(seen, Some(5));
    }

    #[test]
    fn test_waiter_from_committer() {
        let (committer, _waiter) = channel::<i32>();
        let late = committer.waiter();

        committer.set(1).unwrap();
        assert_eq!(late.wait(), Some(1));
    }
}
