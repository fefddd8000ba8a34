//! Shared counter with atomic and plain update semantics
//!
//! Both variants expose the same `increment` / `load` surface so call sites
//! look identical; only the concurrency guarantee differs.
//!
//! 具有原子与普通两种更新语义的共享计数器。两种变体对调用方暴露相同的接口，
//! 区别仅在于并发保证。
//!
//! # Variants | 变体
//!
//! - [`CounterKind::Atomic`]: every increment is one indivisible read-modify-write,
//!   globally ordered with every other operation on the same counter.
//! - [`CounterKind::Plain`]: an increment is a separate load followed by a store,
//!   exactly what an unsynchronized `count += 1` compiles to. Concurrent
//!   increments from several threads lose updates; that loss is inherent to the
//!   missing synchronization at the call site, not a defect of the counter.
//!
//! Both halves of the plain increment are still atomic accesses with `Relaxed`
//! ordering, so a lost update is the only failure mode and it never becomes
//! undefined behavior.
//!
//! # Sharing | 共享
//!
//! Pass counters explicitly as `Arc<SharedCounter>`; there is no global instance.
//!
//! ```
//! use lite_thread::counter::SharedCounter;
//! use std::sync::Arc;
//!
//! let counter = Arc::new(SharedCounter::atomic());
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let counter = Arc::clone(&counter);
//!         std::thread::spawn(move || {
//!             for _ in 0..1000 {
//!                 counter.increment();
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(counter.load(), 4000);
//! ```

use std::fmt;

use crate::shim::atomic::{AtomicUsize, Ordering};

/// Update discipline of a [`SharedCounter`]
///
/// [`SharedCounter`] 的更新方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Indivisible `fetch_add`
    Atomic,
    /// Load then store, with no synchronization between the two
    Plain,
}

/// Counter shared between threads
///
/// 线程间共享的计数器
pub struct SharedCounter {
    value: AtomicUsize,
    kind: CounterKind,
}

impl SharedCounter {
    /// Create a counter starting at zero
    ///
    /// 创建一个从零开始的计数器
    #[inline]
    pub fn new(kind: CounterKind) -> Self {
        Self {
            value: AtomicUsize::new(0),
            kind,
        }
    }

    #[inline]
    pub fn atomic() -> Self {
        Self::new(CounterKind::Atomic)
    }

    #[inline]
    pub fn plain() -> Self {
        Self::new(CounterKind::Plain)
    }

    #[inline]
    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    /// Add one to the counter
    ///
    /// 计数加一
    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    /// Add `n` to the counter, wrapping on overflow
    ///
    /// 计数加 `n`，溢出时回绕
    #[inline]
    pub fn add(&self, n: usize) {
        match self.kind {
            CounterKind::Atomic => {
                self.value.fetch_add(n, Ordering::AcqRel);
            }
            CounterKind::Plain => {
                // Another thread may store between these two lines.
                let current = self.value.load(Ordering::Relaxed);
                self.value.store(current.wrapping_add(n), Ordering::Relaxed);
            }
        }
    }

    /// Read the current value
    ///
    /// For the plain variant the value is only meaningful once every writer has
    /// been joined.
    ///
    /// 读取当前值。对普通变体而言，只有在所有写入线程都已 join 后该值才有意义。
    #[inline]
    pub fn load(&self) -> usize {
        match self.kind {
            CounterKind::Atomic => self.value.load(Ordering::Acquire),
            CounterKind::Plain => self.value.load(Ordering::Relaxed),
        }
    }
}

impl Default for SharedCounter {
    fn default() -> Self {
        Self::atomic()
    }
}

impl fmt::Debug for SharedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCounter")
            .field("kind", &self.kind)
            .field("value", &self.load())
            .finish()
    }
}
