//! Units of work executed by the queue worker

use crate::facade::{QueueState, StateCell};
use crate::handle::Reply;
use object_queue_core::{ObjectQueue, QueueError};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, trace, warn};

/// One requested queue operation and where to deliver its result.
pub(crate) enum Job<T> {
    Add { entry: T, reply: Reply<()> },
    Size { reply: Reply<usize> },
    Peek { reply: Reply<T> },
    PeekMany { max: usize, reply: Reply<Vec<T>> },
    RemoveOne { reply: Reply<()> },
    RemoveMany { n: usize, reply: Reply<()> },
    Clear { reply: Reply<()> },
    Close { reply: Reply<()> },
}

impl<T> Job<T> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Size { .. } => "size",
            Self::Peek { .. } => "peek",
            Self::PeekMany { .. } => "peek_many",
            Self::RemoveOne { .. } => "remove_one",
            Self::RemoveMany { .. } => "remove_many",
            Self::Clear { .. } => "clear",
            Self::Close { .. } => "close",
        }
    }

    pub(crate) fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }

    /// Run the job against `queue` and deliver its outcome.
    ///
    /// Failures and panics from the queue go to this job's caller only.
    /// A close job marks `state` Closed before replying, even when the
    /// backing queue fails to close: it is not safe to use again.
    pub(crate) fn execute(self, queue: &mut dyn ObjectQueue<T>, state: &StateCell) {
        let name = self.name();
        match self {
            Self::Add { entry, reply } => respond(name, reply, || queue.add(entry)),
            Self::Size { reply } => respond(name, reply, || Ok(queue.size())),
            Self::Peek { reply } => respond(name, reply, || queue.peek()),
            Self::PeekMany { max, reply } => respond(name, reply, || queue.peek_n(max)),
            Self::RemoveOne { reply } => respond(name, reply, || queue.remove()),
            Self::RemoveMany { n, reply } => respond(name, reply, || queue.remove_n(n)),
            Self::Clear { reply } => respond(name, reply, || queue.clear()),
            Self::Close { reply } => {
                let outcome = guarded(|| queue.close());
                state.set(QueueState::Closed);
                info!(ok = outcome.is_ok(), "queue closed");
                finish(name, reply, outcome);
            }
        }
    }

    /// Fail the job without touching any queue.
    pub(crate) fn reject(self, error: impl Fn() -> QueueError) {
        match self {
            Self::Add { reply, .. }
            | Self::RemoveOne { reply }
            | Self::RemoveMany { reply, .. }
            | Self::Clear { reply }
            | Self::Close { reply } => deliver("rejected", reply, Err(error())),
            Self::Size { reply } => deliver("rejected", reply, Err(error())),
            Self::Peek { reply } => deliver("rejected", reply, Err(error())),
            Self::PeekMany { reply, .. } => deliver("rejected", reply, Err(error())),
        }
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeekMany { max, .. } => write!(f, "PeekMany {{ max: {max} }}"),
            Self::RemoveMany { n, .. } => write!(f, "RemoveMany {{ n: {n} }}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Run `op`, converting a panic into [`QueueError::Fault`].
pub(crate) fn guarded<V>(op: impl FnOnce() -> Result<V, QueueError>) -> Result<V, QueueError> {
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| {
        Err(QueueError::Fault {
            message: panic_message(payload.as_ref()),
        })
    })
}

/// Run `op` under [`guarded`] and reply with its outcome.
fn respond<V>(
    name: &'static str,
    reply: Reply<V>,
    op: impl FnOnce() -> Result<V, QueueError>,
) {
    finish(name, reply, guarded(op));
}

/// Log `outcome` and hand it to the caller.
fn finish<V>(name: &'static str, reply: Reply<V>, outcome: Result<V, QueueError>) {
    match &outcome {
        Ok(_) => debug!(op = name, "queue operation completed"),
        Err(e @ (QueueError::Empty | QueueError::InvalidArgument { .. })) => {
            debug!(op = name, error = %e, "queue operation rejected")
        }
        Err(e) => warn!(op = name, error = %e, "queue operation failed"),
    }

    deliver(name, reply, outcome);
}

fn deliver<V>(name: &'static str, reply: Reply<V>, outcome: Result<V, QueueError>) {
    if reply.send(outcome).is_err() {
        trace!(op = name, "caller dropped the result handle");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ResultHandle;
    use object_queue_core::InMemoryQueue;

    #[test]
    fn test_execute_add_then_peek() {
        let mut queue = InMemoryQueue::<String>::new();
        let state = StateCell::new();

        let (reply, added) = ResultHandle::channel();
        Job::Add {
            entry: "first".to_string(),
            reply,
        }
        .execute(&mut queue, &state);
        added.wait().unwrap();

        let (reply, peeked) = ResultHandle::channel();
        Job::Peek { reply }.execute(&mut queue, &state);
        assert_eq!(peeked.wait().unwrap(), "first");
        assert_eq!(state.get(), QueueState::Open);
    }

    #[test]
    fn test_execute_close_marks_state_closed() {
        let mut queue = InMemoryQueue::<String>::new();
        let state = StateCell::new();

        let (reply, closed) = ResultHandle::channel();
        let job = Job::<String>::Close { reply };
        assert!(job.is_close());
        job.execute(&mut queue, &state);

        closed.wait().unwrap();
        assert_eq!(state.get(), QueueState::Closed);
        assert_eq!(queue.size(), 0);
        assert!(queue.peek().unwrap_err().is_closed());
    }

    #[test]
    fn test_execute_failed_close_still_marks_closed() {
        let mut queue = InMemoryQueue::<String>::new();
        queue.close().unwrap();
        let state = StateCell::new();

        let (reply, closed) = ResultHandle::channel();
        Job::<String>::Close { reply }.execute(&mut queue, &state);

        assert!(closed.wait().unwrap_err().is_closed());
        assert_eq!(state.get(), QueueState::Closed);
    }

    #[test]
    fn test_panic_becomes_fault() {
        let (reply, handle) = ResultHandle::<usize>::channel();
        respond("size", reply, || panic!("backing queue exploded"));

        match handle.wait() {
            Err(QueueError::Fault { message }) => assert_eq!(message, "backing queue exploded"),
            other => panic!("expected Fault, got {other:?}"),
        }
    }

    #[test]
    fn test_formatted_panic_message() {
        let (reply, handle) = ResultHandle::<()>::channel();
        let index = 7;
        respond("remove_one", reply, || panic!("bad index {index}"));
        assert!(matches!(
            handle.wait(),
            Err(QueueError::Fault { message }) if message == "bad index 7"
        ));
    }

    #[test]
    fn test_reject_never_touches_queue() {
        let (reply, handle) = ResultHandle::<Vec<String>>::channel();
        Job::<String>::PeekMany { max: 3, reply }.reject(|| QueueError::Closed);
        assert!(handle.wait().unwrap_err().is_closed());
    }

    #[test]
    fn test_debug_names() {
        let (reply, _handle) = ResultHandle::channel();
        let job = Job::<String>::RemoveMany { n: 4, reply };
        assert_eq!(format!("{job:?}"), "RemoveMany { n: 4 }");

        let (reply, _handle) = ResultHandle::channel();
        let job = Job::<String>::Close { reply };
        assert_eq!(format!("{job:?}"), "close");
    }
}
