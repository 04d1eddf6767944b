//! Transport adapter
//!
//! The worker talks to its peer only through a `Session`: something that
//! can push a command and payload back upstream. `RpcClient` is the TCP
//! implementation; tests install their own sessions.

pub mod client;
pub mod frame;

pub use client::RpcClient;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::proto::ProtoCmd;

/// A connected upstream peer
pub trait Session: Send + Sync {
    /// Application identity presented in the handshake
    fn app_id(&self) -> &str;

    /// Send an encoded payload tagged with a command
    fn send(&self, cmd: ProtoCmd, payload: Vec<u8>) -> Result<()>;
}

impl dyn Session {
    /// Encode and send a protobuf message
    pub fn send_message<M: prost::Message>(&self, cmd: ProtoCmd, message: &M) -> Result<()> {
        self.send(cmd, message.encode_to_vec())
    }
}

/// Shared, swappable handle to the current session
///
/// The transport installs a session on connect and clears it on
/// disconnect; the worker reads it whenever a handler needs to reply.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<RwLock<Option<Arc<dyn Session>>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: Arc<dyn Session>) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(session);
    }

    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Current session, if connected
    pub fn get(&self) -> Option<Arc<dyn Session>> {
        let slot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        slot.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.get().is_some()
    }
}

impl fmt::Debug for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(session) => f
                .debug_struct("SessionSlot")
                .field("app_id", &session.app_id())
                .finish(),
            None => f.write_str("SessionSlot(disconnected)"),
        }
    }
}
