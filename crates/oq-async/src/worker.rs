//! The thread that owns the backing queue

use crate::facade::{QueueState, StateCell};
use crate::job::{self, Job};
use object_queue_core::config::WorkerConfig;
use object_queue_core::{ObjectQueue, QueueError};
use std::io;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) type JobSender<T> = mpsc::UnboundedSender<Job<T>>;

/// Sole owner of the backing queue.
///
/// Jobs run one at a time in channel order. The queue never leaves this
/// struct, so no other thread can reach it.
struct Worker<T> {
    queue: Box<dyn ObjectQueue<T> + Send>,
    jobs: mpsc::UnboundedReceiver<Job<T>>,
    state: Arc<StateCell>,
}

/// Start a worker thread for `queue` and return the sender feeding it.
pub(crate) fn spawn<T>(
    queue: Box<dyn ObjectQueue<T> + Send>,
    config: &WorkerConfig,
    state: Arc<StateCell>,
) -> io::Result<JobSender<T>>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let worker = Worker {
        queue,
        jobs: rx,
        state,
    };

    thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || worker.run())?;

    Ok(tx)
}

impl<T> Worker<T> {
    fn run(mut self) {
        info!("queue worker started");
        let mut processed: u64 = 0;

        while let Some(job) = self.jobs.blocking_recv() {
            processed += 1;
            let closing = job.is_close();
            job.execute(&mut *self.queue, &self.state);
            if closing {
                break;
            }
        }

        if self.state.get() != QueueState::Closed {
            // Every facade handle was dropped without a close().
            self.state.set(QueueState::Closed);
            if let Err(e) = job::guarded(|| self.queue.close()) {
                warn!(error = %e, "failed to close abandoned queue");
            }
        }

        // Anything still buffered arrived after the close job.
        self.jobs.close();
        let mut rejected: u64 = 0;
        while let Some(job) = self.jobs.blocking_recv() {
            debug!(op = job.name(), "rejecting operation submitted behind close");
            job.reject(|| QueueError::Closed);
            rejected += 1;
        }

        info!(processed, rejected, "queue worker stopped");
    }
}
