//! Failures stay with the caller that triggered them

mod common;

use common::FaultyQueue;
use object_queue_async::{AsyncQueue, QueueError, QueueState};
use std::path::Path;

#[test]
fn test_io_failure_reaches_only_its_caller() {
    let queue = AsyncQueue::from_queue(FaultyQueue::new());

    let first = queue.add("a".to_string());
    let failing = queue.add("io-error".to_string());
    let last = queue.add("b".to_string());

    first.wait().unwrap();
    match failing.wait() {
        Err(QueueError::Io { path, source }) => {
            assert_eq!(path, Path::new("/faulty/queue"));
            assert_eq!(source.to_string(), "simulated disk failure");
        }
        other => panic!("expected Io, got {other:?}"),
    }
    last.wait().unwrap();

    assert_eq!(queue.peek_all().wait().unwrap(), vec!["a", "b"]);
    assert_eq!(queue.state(), QueueState::Open);
}

#[test]
fn test_panicking_operation_becomes_fault() {
    let queue = AsyncQueue::from_queue(FaultyQueue::new());

    let err = queue.add("panic".to_string()).wait().unwrap_err();
    match err {
        QueueError::Fault { message } => assert!(message.contains("panicked on add")),
        other => panic!("expected Fault, got {other:?}"),
    }

    // The worker survives and keeps serving.
    queue.add("after".to_string()).wait().unwrap();
    assert_eq!(queue.size().wait().unwrap(), 1);
    queue.close().wait().unwrap();
}

#[test]
fn test_caller_errors_do_not_disturb_queue() {
    let queue = AsyncQueue::<String>::create_in_memory();
    assert!(matches!(queue.peek().wait(), Err(QueueError::Empty)));
    assert!(matches!(queue.remove_one().wait(), Err(QueueError::Empty)));

    queue.add("only".to_string()).wait().unwrap();
    let err = queue.remove_many(2).wait().unwrap_err();
    assert!(err.is_invalid_argument(), "{err:?}");
    assert_eq!(err.to_string(), "invalid argument: cannot remove 2 entries from a queue holding 1");

    assert_eq!(queue.peek().wait().unwrap(), "only");
}

#[test]
fn test_dropped_handle_failure_is_discarded() {
    let queue = AsyncQueue::from_queue(FaultyQueue::new());
    drop(queue.add("io-error".to_string()));
    drop(queue.add("panic".to_string()));
    queue.add("ok".to_string()).wait().unwrap();
    assert_eq!(queue.size().wait().unwrap(), 1);
}
