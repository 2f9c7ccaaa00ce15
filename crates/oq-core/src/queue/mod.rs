//! Synchronous FIFO queues
//!
//! [`ObjectQueue`] is the contract every queue implements. Implementations
//! are single-owner: methods take `&mut self` and none of them are meant to
//! be called from more than one thread at a time.

mod file;
mod memory;

pub use file::FileObjectQueue;
pub use memory::InMemoryQueue;

use crate::error::QueueError;

/// A FIFO queue of entries.
///
/// Every method may fail; durable implementations surface file system
/// failures as [`QueueError::Io`]. Once `close` has been called, every
/// further call fails with [`QueueError::Closed`].
pub trait ObjectQueue<T> {
    /// Append an entry at the tail.
    fn add(&mut self, entry: T) -> Result<(), QueueError>;

    /// Number of entries currently stored.
    fn size(&self) -> usize;

    /// Whether the queue holds no entries.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Return the head entry without removing it.
    ///
    /// Fails with [`QueueError::Empty`] when there is nothing to return.
    fn peek(&mut self) -> Result<T, QueueError>;

    /// Return up to `max` entries from the head, in queue order.
    ///
    /// Asking for more than [`size`](Self::size) returns every entry; the
    /// result may be shorter than `max`.
    fn peek_n(&mut self, max: usize) -> Result<Vec<T>, QueueError>;

    /// Remove the head entry.
    ///
    /// Fails with [`QueueError::Empty`] when there is nothing to remove.
    fn remove(&mut self) -> Result<(), QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        self.remove_n(1)
    }

    /// Remove `n` entries from the head.
    ///
    /// `n == 0` is a no-op. Removing more entries than are present fails
    /// with [`QueueError::InvalidArgument`] and leaves the queue untouched.
    fn remove_n(&mut self, n: usize) -> Result<(), QueueError>;

    /// Remove every entry.
    fn clear(&mut self) -> Result<(), QueueError>;

    /// Release the resources held by the queue.
    fn close(&mut self) -> Result<(), QueueError>;
}

impl<T, Q> ObjectQueue<T> for Box<Q>
where
    Q: ObjectQueue<T> + ?Sized,
{
    fn add(&mut self, entry: T) -> Result<(), QueueError> {
        (**self).add(entry)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn peek(&mut self) -> Result<T, QueueError> {
        (**self).peek()
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<T>, QueueError> {
        (**self).peek_n(max)
    }

    fn remove(&mut self) -> Result<(), QueueError> {
        (**self).remove()
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        (**self).remove_n(n)
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        (**self).clear()
    }

    fn close(&mut self) -> Result<(), QueueError> {
        (**self).close()
    }
}

pub(crate) fn check_remove_count(n: usize, size: usize) -> Result<(), QueueError> {
    if n > size {
        return Err(QueueError::InvalidArgument {
            message: format!(
                "cannot remove {n} entries from a queue holding {size}"
            ),
        });
    }
    Ok(())
}
