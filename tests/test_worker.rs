mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use dbsvr::catalog::SchemaRegistry;
use dbsvr::mapper::{Dialect, Mapper};
use dbsvr::proto::ProtoCmd;
use dbsvr::store::SqliteStore;
use dbsvr::transport::SessionSlot;
use dbsvr::worker::{handler, DispatchTable, Envelope, Worker, WorkerContext};

const A: ProtoCmd = ProtoCmd::CsReqExample;
const B: ProtoCmd = ProtoCmd::CsResExample;

fn context() -> WorkerContext {
    WorkerContext::new(
        Mapper::new(Arc::new(SchemaRegistry::default()), Dialect::Sqlite),
        Box::new(SqliteStore::open_in_memory().unwrap()),
        SessionSlot::new(),
    )
}

fn envelope(cmd: ProtoCmd, tag: u8) -> Envelope {
    Envelope::new(cmd as i32, vec![tag])
}

/// Dispatch table for A and B that records (opcode, tag) pairs
fn instrumented() -> (DispatchTable, Arc<Mutex<Vec<(i32, u8)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let entries = [A, B].map(|cmd| {
        let seen = seen.clone();
        (
            cmd,
            handler(move |_, envelope| {
                seen.lock().unwrap().push((envelope.opcode, envelope.payload[0]));
                Ok(())
            }),
        )
    });
    (DispatchTable::new(entries).unwrap(), seen)
}

#[test]
fn test_fifo_order() {
    let (dispatch, seen) = instrumented();
    let worker = Worker::with_dispatch(8, context(), dispatch).unwrap();
    worker.start().unwrap();

    worker.blocking_push(envelope(A, 1)).unwrap();
    worker.blocking_push(envelope(B, 2)).unwrap();
    worker.blocking_push(envelope(A, 3)).unwrap();
    worker.stop().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(A as i32, 1), (B as i32, 2), (A as i32, 3)]
    );
}

#[test]
fn test_fifo_across_producers_via_handle() {
    let (dispatch, seen) = instrumented();
    let worker = Worker::with_dispatch(4, context(), dispatch).unwrap();
    worker.start().unwrap();

    let handle = worker.handle();
    let producer = thread::spawn(move || {
        for tag in 0..50u8 {
            handle.blocking_push(envelope(A, tag)).unwrap();
        }
    });
    producer.join().unwrap();
    worker.stop().unwrap();

    let tags: Vec<u8> = seen.lock().unwrap().iter().map(|(_, tag)| *tag).collect();
    assert_eq!(tags, (0..50u8).collect::<Vec<_>>());
}

#[test]
fn test_unregistered_opcode_is_ignored() {
    let (dispatch, seen) = instrumented();
    let worker = Worker::with_dispatch(8, context(), dispatch).unwrap();
    worker.start().unwrap();

    worker.blocking_push(Envelope::new(4242, Vec::new())).unwrap();
    worker.blocking_push(envelope(B, 9)).unwrap();
    worker.stop().unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(B as i32, 9)]);
}

#[test]
fn test_handler_error_does_not_stop_worker() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let dispatch = DispatchTable::new([(
        A,
        handler(move |_, envelope| {
            counter.fetch_add(1, Ordering::SeqCst);
            if envelope.payload[0] == 0 {
                return Err(dbsvr::Error::decode("test", "bad"));
            }
            Ok(())
        }),
    )])
    .unwrap();
    let worker = Worker::with_dispatch(8, context(), dispatch).unwrap();
    worker.start().unwrap();

    worker.blocking_push(envelope(A, 0)).unwrap();
    worker.blocking_push(envelope(A, 1)).unwrap();
    worker.stop().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_full_queue_blocks_push() {
    let (held_tx, held_rx) = std_mpsc::channel::<u8>();
    let (release_tx, release_rx) = std_mpsc::channel::<()>();
    let held_tx = Mutex::new(held_tx);
    let release_rx = Mutex::new(release_rx);

    let dispatch = DispatchTable::new([(
        A,
        handler(move |_, envelope| {
            // Hold the consumer until the test releases it
            held_tx.lock().unwrap().send(envelope.payload[0]).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
            Ok(())
        }),
    )])
    .unwrap();
    let worker = Worker::with_dispatch(1, context(), dispatch).unwrap();
    worker.start().unwrap();

    let released = Arc::new(AtomicUsize::new(0));
    let released_seen = released.clone();
    let (pushed_tx, pushed_rx) = std_mpsc::channel::<(u8, usize)>();
    let handle = worker.handle();
    let producer = thread::spawn(move || {
        for tag in 0..3 {
            handle.blocking_push(envelope(A, tag)).unwrap();
            pushed_tx.send((tag, released_seen.load(Ordering::SeqCst))).unwrap();
        }
    });

    // The consumer holds entry 0 and entry 1 fills the only slot
    assert_eq!(held_rx.recv().unwrap(), 0);
    assert_eq!(pushed_rx.recv().unwrap(), (0, 0));
    assert_eq!(pushed_rx.recv().unwrap(), (1, 0));
    assert!(pushed_rx.try_recv().is_err());

    // Entry 2 only gets in once the consumer moves on to entry 1
    released.fetch_add(1, Ordering::SeqCst);
    release_tx.send(()).unwrap();
    assert_eq!(held_rx.recv().unwrap(), 1);
    let (tag, released_before) = pushed_rx.recv().unwrap();
    assert_eq!(tag, 2);
    assert_eq!(released_before, 1);
    producer.join().unwrap();

    release_tx.send(()).unwrap();
    assert_eq!(held_rx.recv().unwrap(), 2);
    release_tx.send(()).unwrap();
    worker.stop().unwrap();
}

#[tokio::test]
async fn test_async_push_from_runtime() {
    let (dispatch, seen) = instrumented();
    let worker = Worker::with_dispatch(2, context(), dispatch).unwrap();
    worker.start().unwrap();

    for tag in 0..5 {
        worker.push(envelope(B, tag)).await.unwrap();
    }

    // stop() blocks, so run it off the runtime threads
    tokio::task::spawn_blocking(move || worker.stop())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 5);
}
