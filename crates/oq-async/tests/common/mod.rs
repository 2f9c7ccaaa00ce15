//! Test helpers shared by the async queue integration tests

#![allow(dead_code)]

use object_queue_async::AsyncQueue;
use object_queue_core::{InMemoryQueue, ObjectQueue, QueueError, StringConverter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// The two ways to build a facade; every scenario runs against both.
#[derive(Debug, Clone, Copy)]
pub enum Factory {
    File,
    Memory,
}

impl Factory {
    pub const ALL: [Factory; 2] = [Factory::File, Factory::Memory];

    pub fn create(self, dir: &Path) -> AsyncQueue<String> {
        match self {
            Factory::File => {
                AsyncQueue::create_persisted(queue_path(dir), StringConverter).unwrap()
            }
            Factory::Memory => AsyncQueue::create_in_memory(),
        }
    }

    /// A queue pre-loaded with "one", "two", "three".
    pub fn seeded(self, dir: &Path) -> AsyncQueue<String> {
        let queue = self.create(dir);
        for entry in ["one", "two", "three"] {
            queue.add(entry.to_string()).wait().unwrap();
        }
        queue
    }
}

pub fn queue_path(dir: &Path) -> PathBuf {
    dir.join("object-queue")
}

/// Counters observed by [`ProbeQueue`].
#[derive(Debug, Default)]
pub struct Probe {
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
    pub closed: AtomicBool,
}

impl Probe {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a Probe);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An in-memory queue that records how many calls overlap.
pub struct ProbeQueue<T> {
    inner: InMemoryQueue<T>,
    probe: Arc<Probe>,
}

impl<T> ProbeQueue<T> {
    pub fn new() -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        (
            Self {
                inner: InMemoryQueue::new(),
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }

    fn enter(probe: &Probe) -> InFlight<'_> {
        let now = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        probe.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which an overlapping call would be seen.
        std::thread::sleep(Duration::from_micros(20));
        InFlight(probe)
    }
}

impl<T: Clone> ObjectQueue<T> for ProbeQueue<T> {
    fn add(&mut self, entry: T) -> Result<(), QueueError> {
        let _guard = Self::enter(&self.probe);
        self.inner.add(entry)
    }

    fn size(&self) -> usize {
        let _guard = Self::enter(&self.probe);
        self.inner.size()
    }

    fn peek(&mut self) -> Result<T, QueueError> {
        let _guard = Self::enter(&self.probe);
        self.inner.peek()
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<T>, QueueError> {
        let _guard = Self::enter(&self.probe);
        self.inner.peek_n(max)
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        let _guard = Self::enter(&self.probe);
        self.inner.remove_n(n)
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        let _guard = Self::enter(&self.probe);
        self.inner.clear()
    }

    fn close(&mut self) -> Result<(), QueueError> {
        let _guard = Self::enter(&self.probe);
        self.probe.closed.store(true, Ordering::SeqCst);
        self.inner.close()
    }
}

/// A queue whose `add` blocks until the test opens the gate.
///
/// `entered` receives a message each time `add` starts, so a test knows
/// the worker is parked inside the backing queue.
pub struct GateQueue {
    inner: InMemoryQueue<String>,
    gate: mpsc::Receiver<()>,
    entered: mpsc::Sender<()>,
}

pub struct Gate {
    pub open: mpsc::Sender<()>,
    pub entered: mpsc::Receiver<()>,
}

impl GateQueue {
    pub fn new() -> (Self, Gate) {
        let (open_tx, open_rx) = mpsc::channel();
        let (entered_tx, entered_rx) = mpsc::channel();
        (
            Self {
                inner: InMemoryQueue::new(),
                gate: open_rx,
                entered: entered_tx,
            },
            Gate {
                open: open_tx,
                entered: entered_rx,
            },
        )
    }
}

impl ObjectQueue<String> for GateQueue {
    fn add(&mut self, entry: String) -> Result<(), QueueError> {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        self.inner.add(entry)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn peek(&mut self) -> Result<String, QueueError> {
        self.inner.peek()
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<String>, QueueError> {
        self.inner.peek_n(max)
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        self.inner.remove_n(n)
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        self.inner.clear()
    }

    fn close(&mut self) -> Result<(), QueueError> {
        self.inner.close()
    }
}

/// A queue that fails on demand.
///
/// `add("io-error")` fails with an I/O error, `add("panic")` panics, and
/// `close` fails when built with `failing_close`.
pub struct FaultyQueue {
    inner: InMemoryQueue<String>,
    failing_close: bool,
}

impl FaultyQueue {
    pub fn new() -> Self {
        Self {
            inner: InMemoryQueue::new(),
            failing_close: false,
        }
    }

    pub fn failing_close() -> Self {
        Self {
            inner: InMemoryQueue::new(),
            failing_close: true,
        }
    }
}

fn disk_error() -> QueueError {
    QueueError::Io {
        path: PathBuf::from("/faulty/queue"),
        source: std::io::Error::other("simulated disk failure"),
    }
}

impl ObjectQueue<String> for FaultyQueue {
    fn add(&mut self, entry: String) -> Result<(), QueueError> {
        match entry.as_str() {
            "io-error" => Err(disk_error()),
            "panic" => panic!("backing queue panicked on add"),
            _ => self.inner.add(entry),
        }
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn peek(&mut self) -> Result<String, QueueError> {
        self.inner.peek()
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<String>, QueueError> {
        self.inner.peek_n(max)
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        self.inner.remove_n(n)
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        self.inner.clear()
    }

    fn close(&mut self) -> Result<(), QueueError> {
        if self.failing_close {
            return Err(disk_error());
        }
        self.inner.close()
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
