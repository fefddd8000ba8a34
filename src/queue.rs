//! Blocking task handoff queue
//!
//! A double-ended queue of [`Task`]s guarded by one mutex, with condition
//! variables so a consumer can sleep until work arrives.
//!
//! 阻塞式任务交接队列：由单个互斥锁保护的 [`Task`] 双端队列，
//! 通过条件变量让消费者在没有任务时休眠。
//!
//! # State machine | 状态机
//!
//! ```text
//!   Open ──close()──▶ Closed
//! ```
//!
//! - `Open`: pushes are accepted; [`TaskQueue::pop`] blocks while empty.
//! - `Closed`: pushes are rejected with the task handed back; remaining items
//!   can still be drained; a `pop` on an empty closed queue returns `None`
//!   instead of blocking.
//!
//! Closing is one-way and idempotent.
//!
//! # Tasks | 任务
//!
//! A [`Task`] is `Box<dyn FnOnce() + Send + 'static>`. The `'static` bound means
//! a task can only capture owned data: move or clone what it needs into the
//! closure, never borrow from the enclosing frame or object.
//!
//! # Example
//!
//! ```
//! use lite_thread::queue::TaskQueue;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let queue = Arc::new(TaskQueue::new());
//! let done = Arc::new(AtomicUsize::new(0));
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     std::thread::spawn(move || {
//!         while let Some(task) = queue.pop() {
//!             task();
//!         }
//!     })
//! };
//!
//! for _ in 0..3 {
//!     let done = Arc::clone(&done);
//!     queue.push(move || { done.fetch_add(1, Ordering::SeqCst); }).unwrap();
//! }
//! queue.close();
//!
//! consumer.join().unwrap();
//! assert_eq!(done.load(Ordering::SeqCst), 3);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;

use crate::counter::SharedCounter;
use crate::shim::sync::{Condvar, Mutex, MutexGuard};
use crate::shim::{lock, wait};

/// An owned, zero-argument unit of work that runs at most once
///
/// 拥有所有权、无参数、最多执行一次的工作单元
pub type Task = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// Error Types
// ============================================================================

pub mod error {
    //! Task queue error types.

    use std::fmt;

    use thiserror::Error;

    use super::Task;

    /// Error returned by `push` once the queue is closed
    ///
    /// Carries the rejected task back to the caller.
    ///
    /// 队列关闭后 `push` 返回的错误，并将被拒绝的任务交还给调用方。
    #[derive(Error)]
    pub enum PushError {
        #[error("task queue closed")]
        Closed(Task),
    }

    impl PushError {
        /// Take back the rejected task
        pub fn into_task(self) -> Task {
            match self {
                PushError::Closed(task) => task,
            }
        }
    }

    impl fmt::Debug for PushError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                PushError::Closed(_) => f.write_str("Closed(..)"),
            }
        }
    }

    /// Error returned by `try_push`
    ///
    /// `try_push` 返回的错误
    #[derive(Error)]
    pub enum TryPushError {
        /// The bounded queue is at capacity
        ///
        /// 有界队列已满
        #[error("task queue full")]
        Full(Task),
        /// The queue is closed
        ///
        /// 队列已关闭
        #[error("task queue closed")]
        Closed(Task),
    }

    impl TryPushError {
        pub fn into_task(self) -> Task {
            match self {
                TryPushError::Full(task) | TryPushError::Closed(task) => task,
            }
        }

        #[inline]
        pub fn is_full(&self) -> bool {
            matches!(self, TryPushError::Full(_))
        }

        #[inline]
        pub fn is_closed(&self) -> bool {
            matches!(self, TryPushError::Closed(_))
        }
    }

    impl fmt::Debug for TryPushError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TryPushError::Full(_) => f.write_str("Full(..)"),
                TryPushError::Closed(_) => f.write_str("Closed(..)"),
            }
        }
    }

    impl From<PushError> for TryPushError {
        fn from(err: PushError) -> Self {
            TryPushError::Closed(err.into_task())
        }
    }

    /// Error returned by `try_pop`
    ///
    /// `try_pop` 返回的错误
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum TryPopError {
        /// The queue is open but has no task right now
        ///
        /// 队列开启但当前没有任务
        #[error("task queue empty")]
        Empty,
        /// The queue is closed and fully drained
        ///
        /// 队列已关闭且已取空
        #[error("task queue closed")]
        Closed,
    }

    /// Error returned by `pop_timeout`
    ///
    /// `pop_timeout` 返回的错误
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum PopTimeoutError {
        #[error("timed out waiting for a task")]
        Timeout,
        #[error("task queue closed")]
        Closed,
    }
}

pub use self::error::{PopTimeoutError, PushError, TryPopError, TryPushError};

// ============================================================================
// Statistics
// ============================================================================

/// Snapshot of a queue's diagnostic counters
///
/// 队列诊断计数器的快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks accepted by any push
    pub pushed: usize,
    /// Tasks handed out by any pop
    pub popped: usize,
    /// Tasks rejected because the queue was closed or full
    pub rejected: usize,
}

struct Counters {
    pushed: SharedCounter,
    popped: SharedCounter,
    rejected: SharedCounter,
}

impl Counters {
    fn new() -> Self {
        Self {
            pushed: SharedCounter::atomic(),
            popped: SharedCounter::atomic(),
            rejected: SharedCounter::atomic(),
        }
    }
}

// ============================================================================
// TaskQueue
// ============================================================================

struct State {
    items: VecDeque<Task>,
    closed: bool,
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// Mutex-guarded task deque with blocking pop
///
/// Share it between the producer and consumer with an `Arc`.
///
/// 带阻塞弹出的互斥锁保护任务双端队列，通过 `Arc` 在生产者与消费者之间共享。
pub struct TaskQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<NonZeroUsize>,
    counters: Counters,
}

impl TaskQueue {
    /// Create an unbounded, open queue
    ///
    /// 创建一个无界且开启的队列
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create an open queue holding at most `capacity` tasks
    ///
    /// A full bounded queue makes [`push`](Self::push) block until a consumer
    /// makes room or the queue is closed.
    ///
    /// 创建最多容纳 `capacity` 个任务的开启队列。队列满时 [`push`](Self::push)
    /// 会阻塞，直到消费者腾出空间或队列关闭。
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<NonZeroUsize>) -> Self {
        let items = match capacity {
            Some(capacity) => VecDeque::with_capacity(capacity.get()),
            None => VecDeque::new(),
        };
        Self {
            state: Mutex::new(State {
                items,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            counters: Counters::new(),
        }
    }

    /// Append a task to the back and wake one waiting consumer
    ///
    /// Never blocks on an unbounded queue beyond the critical section.
    ///
    /// 将任务追加到队尾并唤醒一个等待的消费者。无界队列除临界区外从不阻塞。
    pub fn push<F>(&self, task: F) -> Result<(), PushError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_task(Box::new(task), End::Back)
    }

    /// Insert a task at the front so it is popped next
    ///
    /// 将任务插入队首，使其下一个被弹出
    pub fn push_front<F>(&self, task: F) -> Result<(), PushError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_task(Box::new(task), End::Front)
    }

    /// Push an already boxed [`Task`] to the back
    pub fn push_boxed(&self, task: Task) -> Result<(), PushError> {
        self.push_task(task, End::Back)
    }

    /// Try to push without blocking
    ///
    /// 非阻塞地尝试推入
    pub fn try_push<F>(&self, task: F) -> Result<(), TryPushError>
    where
        F: FnOnce() + Send + 'static,
    {
        let task: Task = Box::new(task);
        let mut state = lock(&self.state);
        if state.closed {
            drop(state);
            self.counters.rejected.increment();
            return Err(TryPushError::Closed(task));
        }
        if self.is_full(&state) {
            drop(state);
            self.counters.rejected.increment();
            return Err(TryPushError::Full(task));
        }
        state.items.push_back(task);
        drop(state);

        self.counters.pushed.increment();
        self.not_empty.notify_one();
        Ok(())
    }

    fn push_task(&self, task: Task, end: End) -> Result<(), PushError> {
        let mut state = lock(&self.state);
        while !state.closed && self.is_full(&state) {
            state = wait(&self.not_full, state);
        }
        if state.closed {
            drop(state);
            self.counters.rejected.increment();
            log::debug!("rejected push on a closed task queue");
            return Err(PushError::Closed(task));
        }

        match end {
            End::Back => state.items.push_back(task),
            End::Front => state.items.push_front(task),
        }
        drop(state);

        self.counters.pushed.increment();
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the front task, blocking while the queue is empty and open
    ///
    /// Returns `None` once the queue is closed and drained.
    ///
    /// 移除队首任务；队列为空且开启时阻塞。队列关闭且取空后返回 `None`。
    pub fn pop(&self) -> Option<Task> {
        let mut state = lock(&self.state);
        loop {
            if let Some(task) = state.items.pop_front() {
                return Some(self.handed_out(state, task));
            }
            if state.closed {
                return None;
            }
            // Spurious wakeups land back here and re-check both predicates.
            state = wait(&self.not_empty, state);
        }
    }

    /// Remove the front task without blocking
    ///
    /// 非阻塞地移除队首任务
    pub fn try_pop(&self) -> Result<Task, TryPopError> {
        let mut state = lock(&self.state);
        match state.items.pop_front() {
            Some(task) => Ok(self.handed_out(state, task)),
            None if state.closed => Err(TryPopError::Closed),
            None => Err(TryPopError::Empty),
        }
    }

    /// Like [`pop`](Self::pop), but gives up after `timeout`
    ///
    /// A timeout leaves the queue unchanged.
    ///
    /// 与 [`pop`](Self::pop) 相同，但在 `timeout` 后放弃。超时不会改变队列。
    #[cfg(not(feature = "loom"))]
    pub fn pop_timeout(&self, timeout: std::time::Duration) -> Result<Task, PopTimeoutError> {
        use std::time::Instant;

        let deadline = Instant::now().checked_add(timeout);
        let mut state = lock(&self.state);
        loop {
            if let Some(task) = state.items.pop_front() {
                return Ok(self.handed_out(state, task));
            }
            if state.closed {
                return Err(PopTimeoutError::Closed);
            }
            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(PopTimeoutError::Timeout);
                    }
                    crate::shim::wait_timeout(&self.not_empty, state, remaining).0
                }
                None => wait(&self.not_empty, state),
            };
        }
    }

    /// Close the queue and wake every waiter
    ///
    /// Tasks already queued stay poppable. Calling this again does nothing.
    ///
    /// 关闭队列并唤醒所有等待者。已入队的任务仍可弹出。重复调用无效果。
    pub fn close(&self) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.items.len();
        drop(state);

        log::debug!("task queue closed with {remaining} pending task(s)");
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    #[inline]
    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    /// Maximum number of queued tasks, `None` when unbounded
    #[inline]
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    /// Snapshot of the diagnostic counters
    ///
    /// 诊断计数器快照
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.counters.pushed.load(),
            popped: self.counters.popped.load(),
            rejected: self.counters.rejected.load(),
        }
    }

    #[inline]
    fn is_full(&self, state: &State) -> bool {
        self.capacity
            .is_some_and(|capacity| state.items.len() >= capacity.get())
    }

    /// Release the lock after a successful pop and wake a blocked producer
    fn handed_out(&self, state: MutexGuard<'_, State>, task: Task) -> Task {
        drop(state);
        self.counters.popped.increment();
        if self.capacity.is_some() {
            self.not_full.notify_one();
        }
        task
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("TaskQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .field("capacity", &self.capacity)
            .finish()
    }
}
