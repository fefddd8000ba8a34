//! Packaged tasks: a closure bundled with the channel that receives its result.
//!
//! 打包任务：将闭包与接收其结果的通道绑定在一起。

use super::{channel, Waiter};
use crate::queue::Task;

/// Wrap `f` into a [`Task`] whose result is committed to the returned [`Waiter`]
///
/// The closure is moved into the task, so it must own everything it touches.
/// If the task is dropped without running, the waiter is never committed.
///
/// 将 `f` 包装为 [`Task`]，其结果提交到返回的 [`Waiter`]。
/// 闭包被移动进任务，因此必须拥有其访问的所有数据。若任务未执行即被丢弃，等待者永远不会收到提交。
///
/// # Example
///
/// ```
/// use lite_thread::oneshot::packaged;
///
/// let (task, waiter) = packaged(|| 2 * 12);
/// std::thread::spawn(task).join().unwrap();
/// assert_eq!(waiter.wait(), Some(24));
/// ```
pub fn packaged<R, F>(f: F) -> (Task, Waiter<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (committer, waiter) = channel();
    let task: Task = Box::new(move || {
        // The committer is private to this task, so this is the only commit.
        let _ = committer.set(f());
    });
    (task, waiter)
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::queue::TaskQueue;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_packaged_runs_on_other_thread() {
        let (task, waiter) = packaged(|| thread::current().id());

        let runner = thread::spawn(task);
        let runner_id = runner.thread().id();
        runner.join().unwrap();

        assert_eq!(waiter.wait(), Some(runner_id));
    }

    #[test]
    fn test_packaged_through_queue() {
        let queue = TaskQueue::new();
        let a = 3;
        let (task, waiter) = packaged(move || a * 2);

        queue.push_boxed(task).unwrap();
        assert!(!waiter.is_committed());

        queue.pop().unwrap()();
        assert_eq!(waiter.wait(), Some(6));
    }

    #[test]
    fn test_dropped_task_never_commits() {
        let (task, waiter) = packaged(|| 1);
        drop(task);

        assert!(waiter.wait_timeout(Duration::from_millis(10)).is_err());
    }
}
