//! Core types for object-queue
//!
//! This crate provides the synchronous FIFO queues that the async facade in
//! `object-queue-async` wraps:
//!
//! - [`ObjectQueue`]: the queue contract (add, peek, remove, close, ...)
//! - [`InMemoryQueue`]: a transient queue backed by a `VecDeque`
//! - [`FileObjectQueue`]: a durable queue stored in a single file
//! - [`Converter`]: the byte mapping a durable queue needs for its entries
//!
//! None of the queues here are safe to share between threads. Callers that
//! need concurrent access go through a single owner that serializes calls.

pub mod config;
pub mod converter;
pub mod error;
pub mod lock;
pub mod logging;
pub mod queue;

pub use converter::{Converter, JsonConverter, StringConverter};
pub use error::QueueError;
pub use queue::{FileObjectQueue, InMemoryQueue, ObjectQueue};
