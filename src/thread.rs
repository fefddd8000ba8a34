//! RAII thread handles
//!
//! A [`ThreadHandle`] owns a running thread and resolves it when dropped: the
//! chosen [`DisposalPolicy`] either joins it or detaches it. The thread is never
//! silently left behind in a joinable state, no matter how the owning scope
//! exits (normal return, early return, or unwinding).
//!
//! RAII 线程句柄。[`ThreadHandle`] 拥有一个正在运行的线程，并在被丢弃时按
//! [`DisposalPolicy`] 对其执行 join 或 detach。无论所属作用域以何种方式退出
//! （正常返回、提前返回或栈展开），线程都不会被悄悄遗弃。
//!
//! # Drop order | 析构顺序
//!
//! Rust drops struct fields in declaration order. When a struct owns a
//! `ThreadHandle` alongside state the thread uses, the thread has to stop before
//! that state goes away: either declare the handle first, or resolve it in the
//! struct's own `Drop`. Anything the thread can reach through `'static` captures
//! (an `Arc`, for instance) stays alive regardless.
//!
//! Rust 按声明顺序析构结构体字段。若结构体同时拥有 `ThreadHandle` 和线程所使用的状态，
//! 线程必须在该状态销毁之前停止：要么将句柄声明在前，要么在结构体自身的 `Drop` 中处理它。
//!
//! # Example
//!
//! ```
//! use lite_thread::thread::{DisposalPolicy, ThreadHandle};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let a = Arc::new(AtomicU32::new(3));
//! {
//!     let a = Arc::clone(&a);
//!     let _t = ThreadHandle::spawn(DisposalPolicy::Join, move || {
//!         a.fetch_add(3, Ordering::SeqCst);
//!     })
//!     .unwrap();
//! } // joined here
//! assert_eq!(a.load(Ordering::SeqCst), 6);
//! ```

use std::any::Any;
use std::fmt;
use std::mem::ManuallyDrop;
use std::thread::{self, JoinHandle, Thread};

// ============================================================================
// Error Types
// ============================================================================

pub mod error {
    //! Thread handle error types.

    use std::io;

    use thiserror::Error;

    /// The platform refused to start a thread
    ///
    /// 平台拒绝启动线程
    #[derive(Debug, Error)]
    #[error("failed to spawn thread")]
    pub struct SpawnError(#[from] pub io::Error);

    /// Joining a thread did not produce its result
    ///
    /// join 线程未能得到其结果
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum JoinError {
        /// The thread panicked
        ///
        /// 线程发生了 panic
        #[error("thread '{thread}' panicked: {message}")]
        Panicked { thread: String, message: String },
        /// The join was requested from the thread itself; it was detached instead
        ///
        /// 在线程自身内部请求 join；改为 detach
        #[error("thread '{thread}' cannot join itself")]
        SelfJoin { thread: String },
    }
}

pub use self::error::{JoinError, SpawnError};

// ============================================================================
// Disposal Policy
// ============================================================================

/// What a [`ThreadHandle`] does with a still-running thread when dropped
///
/// [`ThreadHandle`] 被丢弃时对仍在运行的线程执行的操作
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisposalPolicy {
    /// Block until the thread finishes
    ///
    /// 阻塞直到线程结束
    #[default]
    Join,
    /// Let the thread run on independently
    ///
    /// 让线程独立继续运行
    Detach,
}

// ============================================================================
// Thread Options
// ============================================================================

/// Configuration for spawning a thread owned by a [`ThreadHandle`]
///
/// 用于启动由 [`ThreadHandle`] 拥有的线程的配置
#[derive(Debug, Clone, Default)]
pub struct ThreadOptions {
    name: Option<String>,
    stack_size: Option<usize>,
    policy: DisposalPolicy,
}

impl ThreadOptions {
    /// Default options: unnamed, platform stack size, [`DisposalPolicy::Join`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name<N: Into<String>>(self, name: N) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Stack size in bytes
    pub fn stack_size(self, bytes: usize) -> Self {
        Self {
            stack_size: Some(bytes),
            ..self
        }
    }

    pub fn policy(self, policy: DisposalPolicy) -> Self {
        Self { policy, ..self }
    }

    #[inline]
    pub fn disposal(&self) -> DisposalPolicy {
        self.policy
    }

    /// Start a thread running `f` and wrap it in a [`ThreadHandle`]
    ///
    /// 启动运行 `f` 的线程并将其包装为 [`ThreadHandle`]
    pub fn spawn<F, T>(self, f: F) -> Result<ThreadHandle<T>, SpawnError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        let handle = builder.spawn(f)?;
        log::trace!(
            "spawned thread '{}' with {:?} disposal",
            thread_label(handle.thread()),
            self.policy
        );
        Ok(ThreadHandle::new(handle, self.policy))
    }
}

// ============================================================================
// ThreadHandle
// ============================================================================

/// Owning handle that resolves its thread on drop
///
/// Not `Clone`: a thread has exactly one owning handle at a time. Moving the
/// handle moves ownership of the thread; assigning over a handle drops the old
/// one, which resolves the thread it held.
///
/// 在析构时处理其线程的所有权句柄。不实现 `Clone`：一个线程同一时刻只有一个所属句柄。
/// 移动句柄即移动线程的所有权；对句柄重新赋值会丢弃旧句柄，从而处理其持有的线程。
pub struct ThreadHandle<T = ()> {
    policy: DisposalPolicy,
    // Taken exactly once: by `join`, `detach`, or `Drop`.
    thread: ManuallyDrop<JoinHandle<T>>,
}

impl<T> ThreadHandle<T> {
    /// Take ownership of an already started thread
    ///
    /// 接管一个已启动线程的所有权
    #[inline]
    pub fn new(thread: JoinHandle<T>, policy: DisposalPolicy) -> Self {
        Self {
            policy,
            thread: ManuallyDrop::new(thread),
        }
    }

    /// The underlying thread, for operations the handle doesn't wrap
    ///
    /// 底层线程，用于句柄未封装的操作（如 `unpark`）
    #[inline]
    pub fn get(&self) -> &Thread {
        self.thread.thread()
    }

    #[inline]
    pub fn policy(&self) -> DisposalPolicy {
        self.policy
    }

    /// Change what happens at drop
    #[inline]
    pub fn set_policy(&mut self, policy: DisposalPolicy) {
        self.policy = policy;
    }

    /// Whether the thread's closure has returned
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the thread finishes and return what it produced
    ///
    /// 阻塞直到线程结束并返回其结果
    pub fn join(self) -> Result<T, JoinError> {
        join_thread(self.into_inner())
    }

    /// Sever the handle from its thread and let the thread run on
    ///
    /// 断开句柄与线程的联系，让线程继续运行
    pub fn detach(self) {
        detach_thread(self.into_inner());
    }

    /// Give up the handle without running `Drop`
    fn into_inner(self) -> JoinHandle<T> {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the thread is taken exactly once.
        unsafe { ManuallyDrop::take(&mut this.thread) }
    }
}

impl<T: Send + 'static> ThreadHandle<T> {
    /// Spawn an unnamed thread with default options and the given policy
    ///
    /// 以默认配置和给定策略启动一个未命名线程
    pub fn spawn<F>(policy: DisposalPolicy, f: F) -> Result<Self, SpawnError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        ThreadOptions::new().policy(policy).spawn(f)
    }
}

impl<T> Drop for ThreadHandle<T> {
    fn drop(&mut self) {
        // SAFETY: `join`/`detach` bypass `Drop`, so this is the only take.
        let handle = unsafe { ManuallyDrop::take(&mut self.thread) };

        match self.policy {
            DisposalPolicy::Join => {
                // Destructors don't raise: a failed join is reported and swallowed.
                if let Err(err) = join_thread(handle) {
                    match err {
                        JoinError::SelfJoin { .. } => log::warn!("{err}; detached on drop"),
                        JoinError::Panicked { .. } => log::error!("joined on drop: {err}"),
                    }
                }
            }
            DisposalPolicy::Detach => detach_thread(handle),
        }
    }
}

impl<T> fmt::Debug for ThreadHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("policy", &self.policy)
            .field("thread", &thread_label(self.get()))
            .finish()
    }
}

fn join_thread<T>(handle: JoinHandle<T>) -> Result<T, JoinError> {
    let label = thread_label(handle.thread());

    // Joining ourselves would deadlock; the handle is dropped, which detaches.
    if handle.thread().id() == thread::current().id() {
        return Err(JoinError::SelfJoin { thread: label });
    }

    handle.join().map_err(|payload| JoinError::Panicked {
        thread: label,
        message: panic_message(payload.as_ref()),
    })
}

fn detach_thread<T>(handle: JoinHandle<T>) {
    log::debug!("detaching thread '{}'", thread_label(handle.thread()));
    drop(handle);
}

fn thread_label(thread: &Thread) -> String {
    match thread.name() {
        Some(name) => name.to_owned(),
        None => format!("{:?}", thread.id()),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("<non-string panic payload>")
    }
}

// ============================================================================
// Deferred
// ============================================================================

/// Start `f` on a new thread right away and return a handle to its result
///
/// Unlike lazy evaluation, the work always runs on its own thread,
/// concurrently with the caller. Dropping the returned [`Deferred`] without
/// calling [`get`](Deferred::get) blocks until the thread is done.
///
/// 立即在新线程上启动 `f` 并返回其结果的句柄。工作总是在独立线程上与调用方并发执行。
/// 未调用 [`get`](Deferred::get) 就丢弃返回的 [`Deferred`] 会阻塞直到线程结束。
///
/// # Example
///
/// ```
/// use lite_thread::thread::spawn_async;
///
/// let deferred = spawn_async(|| 3 * 2).unwrap();
/// assert_eq!(deferred.get().unwrap(), 6);
/// ```
pub fn spawn_async<F, R>(f: F) -> Result<Deferred<R>, SpawnError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let handle = ThreadHandle::spawn(DisposalPolicy::Join, f)?;
    Ok(Deferred { handle })
}

/// Result of a computation running on its own thread
///
/// 在独立线程上运行的计算的结果
#[derive(Debug)]
pub struct Deferred<R> {
    handle: ThreadHandle<R>,
}

impl<R> Deferred<R> {
    /// Block until the computation finishes and take its result
    ///
    /// 阻塞直到计算结束并取出结果
    pub fn get(self) -> Result<R, JoinError> {
        self.handle.join()
    }

    /// Whether [`get`](Self::get) would return without blocking
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.handle.is_finished()
    }

    #[inline]
    pub fn thread(&self) -> &Thread {
        self.handle.get()
    }
}
