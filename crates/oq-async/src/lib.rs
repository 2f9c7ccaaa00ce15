//! Thread-safe asynchronous access to a single-owner FIFO queue
//!
//! The queues in `object-queue-core` are synchronous and must not be used
//! from more than one thread. [`AsyncQueue`] hands the queue to a dedicated
//! worker thread and turns every operation into a message:
//!
//! ```text
//! caller threads          worker thread              backing queue
//!   add(x)  --Job::Add-->  +--------------+
//!   size()  --Job::Size--> | one job at a | --add/size/peek/...-->
//!   close() --Job::Close-> | time, FIFO   |
//!      ^                   +--------------+
//!      '------ ResultHandle <-- oneshot reply
//! ```
//!
//! Ordering is by arrival in the worker's channel. Jobs one caller submits
//! run in the order it submitted them. Jobs from different threads run in
//! whatever order they reached the channel, and that includes `close()`:
//! a job racing another thread's `close()` may land before or after it.
//!
//! # Example
//!
//! ```
//! use object_queue_async::AsyncQueue;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), object_queue_async::QueueError> {
//! let queue = AsyncQueue::<String>::create_in_memory();
//! queue.add("one".to_string()).await?;
//! queue.add("two".to_string()).await?;
//!
//! assert_eq!(queue.size().await?, 2);
//! assert_eq!(queue.peek_many(5).await?, vec!["one", "two"]);
//!
//! queue.close().await?;
//! assert!(queue.add("three".to_string()).await.unwrap_err().is_closed());
//! # Ok(())
//! # }
//! ```

mod facade;
mod handle;
mod job;
mod worker;

pub use facade::{AsyncQueue, QueueState};
pub use handle::ResultHandle;

pub use object_queue_core::QueueError;
