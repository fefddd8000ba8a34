//! Consumer thread draining a [`TaskQueue`]
//!
//! A [`Worker`] hosts the consumer side of a queue inside a [`ThreadHandle`].
//! It runs tasks in FIFO order until the queue is closed and drained.
//!
//! 在 [`ThreadHandle`] 中承载队列消费端的工作线程，按 FIFO 顺序执行任务，
//! 直到队列关闭并取空。
//!
//! ```
//! use lite_thread::queue::TaskQueue;
//! use lite_thread::thread::ThreadOptions;
//! use lite_thread::worker::Worker;
//! use std::sync::Arc;
//!
//! let worker = Worker::spawn(Arc::new(TaskQueue::new()), ThreadOptions::new()).unwrap();
//! let answer = worker.submit(|| 2 * 21).unwrap();
//! assert_eq!(answer.wait(), Some(42));
//! assert_eq!(worker.shutdown(), Ok(1));
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::oneshot::{packaged, Waiter};
use crate::queue::{PushError, TaskQueue};
use crate::thread::{panic_message, JoinError, SpawnError, ThreadHandle, ThreadOptions};

/// Thread that pops and runs tasks from a shared queue
///
/// Dropping the worker closes its queue first, so the thread finishes the
/// tasks already queued and exits; the [`ThreadHandle`] then joins or detaches
/// it according to the configured policy.
///
/// 从共享队列弹出并执行任务的线程。丢弃 worker 时先关闭队列，线程执行完已入队的任务后退出，
/// 随后 [`ThreadHandle`] 按配置的策略 join 或 detach。
pub struct Worker {
    // Resolved in `Drop` after the queue is closed; the thread holds its own `Arc`.
    handle: Option<ThreadHandle<usize>>,
    queue: Arc<TaskQueue>,
}

impl Worker {
    /// Start a consumer thread for `queue`
    ///
    /// 为 `queue` 启动消费者线程
    pub fn spawn(queue: Arc<TaskQueue>, options: ThreadOptions) -> Result<Self, SpawnError> {
        let consumer = Arc::clone(&queue);
        let handle = options.spawn(move || run(&consumer))?;
        Ok(Self {
            handle: Some(handle),
            queue,
        })
    }

    /// Queue `f` and return a waiter for its result
    ///
    /// 将 `f` 入队并返回其结果的等待者
    pub fn submit<F, R>(&self, f: F) -> Result<Waiter<R>, PushError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, waiter) = packaged(f);
        self.queue.push_boxed(task)?;
        Ok(waiter)
    }

    #[inline]
    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    /// Close the queue, wait for the thread, and return how many tasks it ran
    ///
    /// 关闭队列，等待线程结束，并返回其执行的任务数量
    pub fn shutdown(mut self) -> Result<usize, JoinError> {
        self.queue.close();
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(0),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.queue.close();
        drop(self.handle.take());
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("handle", &self.handle)
            .field("queue", &self.queue)
            .finish()
    }
}

fn run(queue: &TaskQueue) -> usize {
    log::trace!("worker starting");

    let mut completed = 0;
    while let Some(task) = queue.pop() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            log::error!("task panicked on worker: {}", panic_message(payload.as_ref()));
        }
        completed += 1;
    }

    log::trace!("worker exiting after {completed} task(s)");
    completed
}
