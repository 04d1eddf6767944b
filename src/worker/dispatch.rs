//! Dispatch table
//!
//! Fixed map from command to handler, validated when it is built.

use std::collections::HashMap;
use std::fmt;

use super::handlers;
use super::Envelope;
use crate::error::{Error, Result};
use crate::mapper::Mapper;
use crate::proto::ProtoCmd;
use crate::store::Store;
use crate::transport::SessionSlot;

/// State owned by the consumer thread and lent to each handler
pub struct WorkerContext {
    pub mapper: Mapper,
    pub store: Box<dyn Store>,
    pub session: SessionSlot,
}

impl WorkerContext {
    pub fn new(mapper: Mapper, store: Box<dyn Store>, session: SessionSlot) -> Self {
        Self {
            mapper,
            store,
            session,
        }
    }
}

impl fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerContext")
            .field("mapper", &self.mapper)
            .field("store", &self.store.backend())
            .field("session", &self.session)
            .finish()
    }
}

/// A command handler
pub type Handler = Box<dyn Fn(&mut WorkerContext, &Envelope) -> Result<()> + Send>;

/// Box a closure as a `Handler`
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut WorkerContext, &Envelope) -> Result<()> + Send + 'static,
{
    Box::new(f)
}

/// Command to handler map
pub struct DispatchTable {
    handlers: HashMap<i32, Handler>,
}

impl DispatchTable {
    /// Build a table, rejecting duplicate commands
    pub fn new(entries: impl IntoIterator<Item = (ProtoCmd, Handler)>) -> Result<Self> {
        let mut table = HashMap::new();
        for (cmd, handler) in entries {
            let opcode = cmd as i32;
            if table.insert(opcode, handler).is_some() {
                return Err(Error::DuplicateHandler(opcode));
            }
        }
        Ok(Self { handlers: table })
    }

    /// The service's built-in handlers
    pub fn standard() -> Result<Self> {
        Self::new([
            (ProtoCmd::IpcStreamAuthHandshake, handler(handlers::handle_handshake)),
            (ProtoCmd::CsResExample, handler(handlers::handle_example_res)),
            (
                ProtoCmd::DbsvrgoWriteDbUserRecordReq,
                handler(handlers::handle_write_user_record),
            ),
            (
                ProtoCmd::DbsvrgoSelectDbUserRecordReq,
                handler(handlers::handle_select_user_record),
            ),
        ])
    }

    pub fn contains(&self, opcode: i32) -> bool {
        self.handlers.contains_key(&opcode)
    }

    /// Registered opcodes in ascending order
    pub fn opcodes(&self) -> Vec<i32> {
        let mut opcodes: Vec<i32> = self.handlers.keys().copied().collect();
        opcodes.sort_unstable();
        opcodes
    }

    /// Run the handler for an envelope's opcode
    pub fn dispatch(&self, ctx: &mut WorkerContext, envelope: &Envelope) -> Result<()> {
        let handler = self
            .handlers
            .get(&envelope.opcode)
            .ok_or(Error::Dispatch(envelope.opcode))?;
        handler(ctx, envelope)
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("opcodes", &self.opcodes())
            .finish()
    }
}
