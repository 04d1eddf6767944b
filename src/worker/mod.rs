//! Command worker
//!
//! A bounded queue drained by exactly one consumer thread. Every handler
//! runs on that thread, one envelope at a time and in arrival order, which
//! serializes all database access without further locking.
//!
//! Lifecycle: constructed, running after `start`, stopped after `stop`.
//! `stop` drains what was queued before it, then joins the thread.

pub mod dispatch;
pub mod handlers;

pub use dispatch::{handler, DispatchTable, Handler, WorkerContext};

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::proto::ProtoPackage;
use crate::transport::{Session, SessionSlot};

/// Name of the consumer thread
pub const WORKER_THREAD_NAME: &str = "dbsvr-worker";

/// One inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub opcode: i32,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(opcode: i32, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }
}

impl From<ProtoPackage> for Envelope {
    fn from(package: ProtoPackage) -> Self {
        Self {
            opcode: package.cmd,
            payload: package.protocol,
        }
    }
}

/// Queue entry
#[derive(Debug)]
pub(crate) enum Command {
    Envelope(Envelope),
    Stop,
}

impl Command {
    #[cfg(test)]
    pub(crate) fn into_envelope(self) -> Option<Envelope> {
        match self {
            Command::Envelope(envelope) => Some(envelope),
            Command::Stop => None,
        }
    }
}

/// Cloneable producer side of the worker queue
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<Command>,
}

impl WorkerHandle {
    pub(crate) fn from_sender(sender: mpsc::Sender<Command>) -> Self {
        Self { sender }
    }

    /// Enqueue, waiting for capacity
    pub async fn push(&self, envelope: Envelope) -> Result<()> {
        self.sender
            .send(Command::Envelope(envelope))
            .await
            .map_err(|_| Error::WorkerClosed)
    }

    /// Enqueue from a plain thread, blocking while the queue is full
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_push(&self, envelope: Envelope) -> Result<()> {
        self.sender
            .blocking_send(Command::Envelope(envelope))
            .map_err(|_| Error::WorkerClosed)
    }

    /// Check if the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

enum State {
    Constructed {
        receiver: mpsc::Receiver<Command>,
        ctx: WorkerContext,
        dispatch: DispatchTable,
    },
    Running(JoinHandle<()>),
    Stopped,
}

/// The single-consumer command worker
pub struct Worker {
    handle: WorkerHandle,
    session: SessionSlot,
    state: Mutex<State>,
}

impl Worker {
    /// Create a worker with the built-in dispatch table
    pub fn new(capacity: usize, ctx: WorkerContext) -> Result<Self> {
        Self::with_dispatch(capacity, ctx, DispatchTable::standard()?)
    }

    /// Create a worker with a custom dispatch table
    pub fn with_dispatch(
        capacity: usize,
        ctx: WorkerContext,
        dispatch: DispatchTable,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("worker queue capacity must be > 0".into()));
        }
        let (sender, receiver) = mpsc::channel(capacity);
        Ok(Self {
            handle: WorkerHandle::from_sender(sender),
            session: ctx.session.clone(),
            state: Mutex::new(State::Constructed {
                receiver,
                ctx,
                dispatch,
            }),
        })
    }

    /// Spawn the consumer thread
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match mem::replace(&mut *state, State::Stopped) {
            State::Constructed {
                receiver,
                ctx,
                dispatch,
            } => {
                let join = thread::Builder::new()
                    .name(WORKER_THREAD_NAME.to_string())
                    .spawn(move || consume(receiver, ctx, dispatch))?;
                *state = State::Running(join);
                Ok(())
            }
            running @ State::Running(_) => {
                *state = running;
                Err(Error::WorkerAlreadyStarted)
            }
            State::Stopped => Err(Error::WorkerClosed),
        }
    }

    /// Install the session handlers reply through
    pub fn set_transport_session(&self, session: Arc<dyn Session>) {
        self.session.set(session);
    }

    /// Producer handle for other tasks
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Enqueue, waiting for capacity
    pub async fn push(&self, envelope: Envelope) -> Result<()> {
        self.handle.push(envelope).await
    }

    /// Enqueue from a plain thread, blocking while the queue is full
    pub fn blocking_push(&self, envelope: Envelope) -> Result<()> {
        self.handle.blocking_push(envelope)
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, State::Running(_))
    }

    /// Drain everything queued so far, then stop the consumer
    ///
    /// Blocks the calling thread; must not be called from an async task.
    pub fn stop(&self) -> Result<()> {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            mem::replace(&mut *state, State::Stopped)
        };

        match previous {
            State::Running(join) => {
                // A failed send means the consumer already exited
                let _ = self.handle.sender.blocking_send(Command::Stop);
                join.join().map_err(|_| Error::WorkerPanicked)
            }
            State::Constructed { .. } | State::Stopped => Ok(()),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let State::Running(_) = state {
            // Detach; the thread exits once it reaches the marker
            let _ = self.handle.sender.try_send(Command::Stop);
        }
    }
}

fn consume(mut receiver: mpsc::Receiver<Command>, mut ctx: WorkerContext, dispatch: DispatchTable) {
    info!(backend = ctx.store.backend(), "worker started");
    let mut handled: u64 = 0;

    while let Some(command) = receiver.blocking_recv() {
        let envelope = match command {
            Command::Envelope(envelope) => envelope,
            Command::Stop => break,
        };
        handled += 1;
        if let Err(err) = dispatch.dispatch(&mut ctx, &envelope) {
            warn!(
                cmd = envelope.opcode,
                category = err.category(),
                error = %err,
                "command dropped"
            );
        }
    }

    receiver.close();
    let mut discarded: u64 = 0;
    while let Ok(command) = receiver.try_recv() {
        if let Command::Envelope(_) = command {
            discarded += 1;
        }
    }
    if discarded > 0 {
        warn!(discarded, "discarded commands queued after stop");
    }
    info!(handled, "worker stopped");
}
