//! # lite-thread
//!
//! Small, blocking concurrency primitives for std threads: RAII thread handles,
//! one-shot signaling, and task handoff between a producer and a consumer.
//!
//! 面向 std 线程的小型阻塞式并发原语：RAII 线程句柄、一次性信号，以及生产者与消费者之间的任务交接。
//!
//! ## Modules / 模块
//!
//! ### [`thread`]
//!
//! [`thread::ThreadHandle`] owns a running thread and joins or detaches it on drop,
//! according to its [`thread::DisposalPolicy`]. A thread is never abandoned in a
//! joinable state. [`thread::spawn_async`] always runs work on a fresh thread and
//! joins it when the result handle goes away.
//!
//! [`thread::ThreadHandle`] 拥有一个运行中的线程，并按 [`thread::DisposalPolicy`]
//! 在析构时 join 或 detach。线程永远不会在可 join 状态下被遗弃。
//!
//! ### [`oneshot`]
//!
//! A committer stores a value (or emptiness) exactly once; waiters block until it
//! is committed. Double commits are reported as errors and never overwrite.
//!
//! 提交者只能提交一次值（或空值）；等待者阻塞直到提交发生。重复提交返回错误且不会覆盖。
//!
//! ### [`queue`]
//!
//! [`queue::TaskQueue`] hands ownership of boxed closures from a producer thread to
//! a consumer thread under one mutex, with a blocking `pop` and a one-way `close`.
//!
//! [`queue::TaskQueue`] 在单个互斥锁保护下将闭包的所有权从生产者线程交给消费者线程，
//! 支持阻塞的 `pop` 和单向的 `close`。
//!
//! ### [`worker`]
//!
//! A consumer thread built from the pieces above: it drains a queue inside a
//! `ThreadHandle` and reports task results through one-shot channels.
//!
//! ### [`counter`]
//!
//! Atomic and plain counters behind one API, to show (and test) what lost updates
//! look like when increments are not synchronized.
//!
//! ## Example / 示例
//!
//! ```
//! use lite_thread::oneshot;
//! use lite_thread::queue::TaskQueue;
//! use lite_thread::thread::{DisposalPolicy, ThreadHandle};
//! use std::sync::Arc;
//!
//! let queue = Arc::new(TaskQueue::new());
//! let (done, finished) = oneshot::channel::<u32>();
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     ThreadHandle::spawn(DisposalPolicy::Join, move || {
//!         while let Some(task) = queue.pop() {
//!             task();
//!         }
//!     })
//!     .unwrap()
//! };
//!
//! let a = 3;
//! queue
//!     .push(move || {
//!         let _ = done.set(a);
//!     })
//!     .unwrap();
//!
//! assert_eq!(finished.wait(), Some(3));
//! queue.close();
//! drop(consumer); // joins the consumer
//! ```
//!
//! ## Model checking / 模型检查
//!
//! With `--features loom`, every mutex, condition variable, `Arc` and atomic in the
//! channel, queue and counter comes from `loom`, and the `tests/` suites explore
//! their interleavings. Timed waits and the modules that start real OS threads
//! ([`thread`], [`worker`]) are compiled out in that configuration.

mod shim;

pub mod counter;
pub mod oneshot;
pub mod queue;
#[cfg(not(feature = "loom"))]
pub mod thread;
#[cfg(not(feature = "loom"))]
pub mod worker;

pub use counter::{CounterKind, SharedCounter};
pub use oneshot::{channel, Committer, Waiter};
pub use queue::{Task, TaskQueue};
#[cfg(not(feature = "loom"))]
pub use thread::{DisposalPolicy, ThreadHandle};
