//! Transient queue held in memory

use super::{ObjectQueue, check_remove_count};
use crate::error::QueueError;
use std::collections::VecDeque;

/// A queue whose entries live only as long as the value does.
///
/// Never fails with an I/O error. Entries are cloned out on `peek`.
#[derive(Debug, Clone)]
pub struct InMemoryQueue<T> {
    entries: VecDeque<T>,
    closed: bool,
}

impl<T> InMemoryQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), QueueError> {
        if self.closed {
            Err(QueueError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<T> Default for InMemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ObjectQueue<T> for InMemoryQueue<T> {
    fn add(&mut self, entry: T) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.entries.push_back(entry);
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn peek(&mut self) -> Result<T, QueueError> {
        self.ensure_open()?;
        self.entries.front().cloned().ok_or(QueueError::Empty)
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<T>, QueueError> {
        self.ensure_open()?;
        Ok(self.entries.iter().take(max).cloned().collect())
    }

    fn remove(&mut self) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.entries.pop_front().map(drop).ok_or(QueueError::Empty)
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        self.ensure_open()?;
        check_remove_count(n, self.entries.len())?;
        self.entries.drain(..n);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.entries.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.closed = true;
        self.entries = VecDeque::new();
        Ok(())
    }
}
