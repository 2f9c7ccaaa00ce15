//! The public async queue handle

use crate::handle::{Reply, ResultHandle};
use crate::job::Job;
use crate::worker::{self, JobSender};
use object_queue_core::config::{QueueConfig, WorkerConfig};
use object_queue_core::{Converter, FileObjectQueue, InMemoryQueue, ObjectQueue, QueueError};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc::error::SendError;
use tracing::trace;

/// Lifecycle of an [`AsyncQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Accepting and executing operations.
    Open,
    /// `close()` was requested; the worker has not reached it yet. New
    /// operations are still accepted and run in submission order.
    Closing,
    /// The worker has closed the backing queue. Every operation fails
    /// with [`QueueError::Closed`].
    Closed,
}

/// Lifecycle state shared between facade clones and the worker
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    const OPEN: u8 = 0;
    const CLOSING: u8 = 1;
    const CLOSED: u8 = 2;

    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(Self::OPEN))
    }

    pub(crate) fn get(&self) -> QueueState {
        match self.0.load(Ordering::Acquire) {
            Self::OPEN => QueueState::Open,
            Self::CLOSING => QueueState::Closing,
            _ => QueueState::Closed,
        }
    }

    pub(crate) fn set(&self, state: QueueState) {
        let raw = match state {
            QueueState::Open => Self::OPEN,
            QueueState::Closing => Self::CLOSING,
            QueueState::Closed => Self::CLOSED,
        };
        self.0.store(raw, Ordering::Release);
    }

    fn begin_closing(&self) {
        let _ = self.0.compare_exchange(
            Self::OPEN,
            Self::CLOSING,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// A FIFO queue that any number of threads can use at once.
///
/// All operations are forwarded to a single worker thread that owns the
/// backing [`ObjectQueue`] and runs them one at a time, in the order they
/// arrive. Each call returns immediately with a [`ResultHandle`]; nothing
/// blocks the calling thread.
///
/// Cloning is cheap and every clone talks to the same worker. When the last
/// clone is dropped without [`close`](Self::close), the worker closes the
/// backing queue itself.
///
/// Closing is ordered like any other operation: work submitted before
/// `close()` completes first. Work that reaches the worker after the close
/// job fails with [`QueueError::Closed`]. Across threads, whether an
/// operation lands before or after another thread's `close()` depends on
/// which reached the worker's channel first.
pub struct AsyncQueue<T> {
    jobs: JobSender<T>,
    state: Arc<StateCell>,
}

impl<T> Clone for AsyncQueue<T> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for AsyncQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("state", &self.state.get())
            .finish()
    }
}

impl<T> AsyncQueue<T>
where
    T: Send + 'static,
{
    /// Open a durable queue at `path` with default settings.
    ///
    /// Fails with an I/O-kind [`QueueError`] if the file cannot be opened,
    /// is not a queue file, or is locked by another open queue.
    pub fn create_persisted<C>(path: impl AsRef<Path>, converter: C) -> Result<Self, QueueError>
    where
        C: Converter<T> + Send + 'static,
    {
        Self::create_persisted_with_config(path, converter, &QueueConfig::default())
    }

    /// Open a durable queue at `path`.
    pub fn create_persisted_with_config<C>(
        path: impl AsRef<Path>,
        converter: C,
        config: &QueueConfig,
    ) -> Result<Self, QueueError>
    where
        C: Converter<T> + Send + 'static,
    {
        let queue = FileObjectQueue::open_with_config(path, converter, &config.file)?;
        Self::from_queue_with_config(queue, &config.worker)
    }

    /// Create a transient queue held in memory.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to start the worker thread, like
    /// [`std::thread::spawn`].
    pub fn create_in_memory() -> Self
    where
        T: Clone,
    {
        Self::from_queue(InMemoryQueue::new())
    }

    /// Wrap any backing queue.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to start the worker thread, like
    /// [`std::thread::spawn`].
    pub fn from_queue<Q>(queue: Q) -> Self
    where
        Q: ObjectQueue<T> + Send + 'static,
    {
        match Self::from_queue_with_config(queue, &WorkerConfig::default()) {
            Ok(queue) => queue,
            Err(e) => panic!("{e}"),
        }
    }

    /// Wrap any backing queue, naming the worker thread from `config`.
    pub fn from_queue_with_config<Q>(queue: Q, config: &WorkerConfig) -> Result<Self, QueueError>
    where
        Q: ObjectQueue<T> + Send + 'static,
    {
        let state = Arc::new(StateCell::new());
        let jobs = worker::spawn(Box::new(queue), config, Arc::clone(&state))
            .map_err(QueueError::Spawn)?;
        Ok(Self { jobs, state })
    }
}

impl<T> AsyncQueue<T> {
    /// Current lifecycle state.
    pub fn state(&self) -> QueueState {
        self.state.get()
    }

    /// Append `entry` at the tail.
    pub fn add(&self, entry: T) -> ResultHandle<()> {
        self.submit(|reply| Job::Add { entry, reply })
    }

    /// Number of entries, as seen between the operations around it.
    pub fn size(&self) -> ResultHandle<usize> {
        self.submit(|reply| Job::Size { reply })
    }

    /// The head entry. Fails with [`QueueError::Empty`] on an empty queue.
    pub fn peek(&self) -> ResultHandle<T> {
        self.submit(|reply| Job::Peek { reply })
    }

    /// Up to `max` entries from the head, in order.
    ///
    /// Returns fewer than `max` entries when the queue is shorter; asking
    /// for more than the queue holds is not an error.
    pub fn peek_many(&self, max: usize) -> ResultHandle<Vec<T>> {
        self.submit(|reply| Job::PeekMany { max, reply })
    }

    /// Every entry, head first.
    pub fn peek_all(&self) -> ResultHandle<Vec<T>> {
        self.peek_many(usize::MAX)
    }

    /// Remove the head entry. Fails with [`QueueError::Empty`] on an empty
    /// queue.
    pub fn remove_one(&self) -> ResultHandle<()> {
        self.submit(|reply| Job::RemoveOne { reply })
    }

    /// Remove `n` entries from the head.
    ///
    /// Fails with [`QueueError::InvalidArgument`] when `n` exceeds the
    /// number of entries; nothing is removed in that case.
    pub fn remove_many(&self, n: usize) -> ResultHandle<()> {
        self.submit(|reply| Job::RemoveMany { n, reply })
    }

    /// Remove every entry.
    pub fn clear(&self) -> ResultHandle<()> {
        self.submit(|reply| Job::Clear { reply })
    }

    /// Close the queue after everything already submitted.
    ///
    /// Resolves once the backing queue has released its resources. From
    /// then on, every operation fails with [`QueueError::Closed`],
    /// including further calls to `close()`.
    pub fn close(&self) -> ResultHandle<()> {
        self.state.begin_closing();
        self.submit(|reply| Job::Close { reply })
    }

    fn submit<V>(&self, make_job: impl FnOnce(Reply<V>) -> Job<T>) -> ResultHandle<V> {
        if self.state.get() == QueueState::Closed {
            return ResultHandle::ready(Err(QueueError::Closed));
        }

        let (reply, handle) = ResultHandle::channel();
        let job = make_job(reply);
        trace!(op = job.name(), "submitting queue operation");

        // The worker closed its channel between the state check and now.
        if let Err(SendError(job)) = self.jobs.send(job) {
            job.reject(|| QueueError::Closed);
        }
        handle
    }
}
