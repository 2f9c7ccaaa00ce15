//! Single-resolution handles for queue operation results

use object_queue_core::QueueError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) type Reply<V> = oneshot::Sender<Result<V, QueueError>>;

enum Inner<V> {
    Pending(oneshot::Receiver<Result<V, QueueError>>),
    Ready(Option<Result<V, QueueError>>),
}

/// The eventual outcome of one queue operation.
///
/// Resolves exactly once, to the operation's value or its failure. Await it
/// from async code, or call [`wait`](Self::wait) from a plain thread.
///
/// Dropping a handle does not cancel the operation; the worker still runs
/// it and discards the result.
#[must_use = "the operation runs regardless, but its result is only observable through the handle"]
pub struct ResultHandle<V> {
    inner: Inner<V>,
}

// The receiver is Unpin and resolved values are never pinned.
impl<V> Unpin for ResultHandle<V> {}

impl<V> ResultHandle<V> {
    pub(crate) fn channel() -> (Reply<V>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                inner: Inner::Pending(rx),
            },
        )
    }

    pub(crate) fn ready(result: Result<V, QueueError>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    /// Block the current thread until the operation finishes.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the handle there instead.
    pub fn wait(self) -> Result<V, QueueError> {
        match self.inner {
            Inner::Pending(rx) => rx.blocking_recv().unwrap_or(Err(QueueError::Closed)),
            Inner::Ready(result) => result.unwrap_or(Err(QueueError::Closed)),
        }
    }
}

impl<V> Future for ResultHandle<V> {
    type Output = Result<V, QueueError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            // A dropped reply means the worker is gone without answering.
            Inner::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(QueueError::Closed))),
            Inner::Ready(result) => Poll::Ready(result.take().unwrap_or(Err(QueueError::Closed))),
        }
    }
}

impl<V> fmt::Debug for ResultHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            Inner::Pending(_) => "pending",
            Inner::Ready(Some(Ok(_))) => "ready(ok)",
            Inner::Ready(Some(Err(_))) => "ready(err)",
            Inner::Ready(None) => "consumed",
        };
        f.debug_struct("ResultHandle").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_receives_value() {
        let (reply, handle) = ResultHandle::<u32>::channel();
        std::thread::spawn(move || {
            let _ = reply.send(Ok(42));
        });
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn test_dropped_reply_resolves_closed() {
        let (reply, handle) = ResultHandle::<u32>::channel();
        drop(reply);
        assert!(handle.wait().unwrap_err().is_closed());
    }

    #[test]
    fn test_ready_handle() {
        let handle = ResultHandle::<()>::ready(Err(QueueError::Empty));
        assert_eq!(format!("{handle:?}"), "ResultHandle { state: \"ready(err)\" }");
        assert!(matches!(handle.wait(), Err(QueueError::Empty)));
    }

    #[tokio::test]
    async fn test_await_receives_failure() {
        let (reply, handle) = ResultHandle::<Vec<u8>>::channel();
        reply
            .send(Err(QueueError::InvalidArgument {
                message: "too many".to_string(),
            }))
            .unwrap();
        assert!(handle.await.unwrap_err().is_invalid_argument());
    }
}
