//! RPC client
//!
//! Connects to the upstream RPC peer, performs the handshake and forwards
//! every inbound package into the command worker. Reconnects after a delay
//! until shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::frame::{decode_frame, decode_package, encode_frame};
use super::{Session, SessionSlot};
use crate::config::RpcConfig;
use crate::error::{Error, Result};
use crate::proto::{ProtoCmd, ProtoCsReqExample, ProtoIpcStreamAuthHandshake, ProtoPackage};
use crate::worker::{Envelope, WorkerHandle};

/// Session backed by one TCP connection
///
/// Frames are queued on an unbounded channel drained by the connection's
/// writer task, so `send` never blocks and works from any thread.
struct RpcSession {
    app_id: String,
    max_frame_bytes: u64,
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl Session for RpcSession {
    fn app_id(&self) -> &str {
        &self.app_id
    }

    fn send(&self, cmd: ProtoCmd, payload: Vec<u8>) -> Result<()> {
        let package = ProtoPackage {
            cmd: cmd as i32,
            protocol: payload,
        };
        let frame = encode_frame(&package, self.max_frame_bytes)?;
        self.outbound.send(frame).map_err(|_| Error::NotConnected)
    }
}

/// Reconnecting client for the upstream RPC peer
pub struct RpcClient {
    config: RpcConfig,
    worker: WorkerHandle,
    session: SessionSlot,
}

impl RpcClient {
    pub fn new(config: RpcConfig, worker: WorkerHandle, session: SessionSlot) -> Self {
        Self {
            config,
            worker,
            session,
        }
    }

    /// Run until `shutdown` flips to true or the worker closes
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);

        loop {
            tokio::select! {
                result = self.run_connection() => match result {
                    Ok(()) => info!(addr = %self.config.addr, "rpc connection closed by peer"),
                    Err(Error::WorkerClosed) => {
                        self.session.clear();
                        info!("worker closed, rpc client exiting");
                        return Ok(());
                    }
                    Err(err) => {
                        warn!(addr = %self.config.addr, error = %err, "rpc connection failed")
                    }
                },
                _ = shutdown.changed() => {}
            }
            self.session.clear();

            if stopping(&shutdown) {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {}
            }
            if stopping(&shutdown) {
                break;
            }
        }

        info!("rpc client stopped");
        Ok(())
    }

    async fn run_connection(&self) -> Result<()> {
        let stream = TcpStream::connect(&self.config.addr).await?;
        stream.set_nodelay(true)?;
        info!(addr = %self.config.addr, "connected to rpc peer");

        let (reader, writer) = stream.into_split();
        let (outbound, frames) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_frames(writer, frames));

        let session: Arc<dyn Session> = Arc::new(RpcSession {
            app_id: self.config.app_id.clone(),
            max_frame_bytes: self.config.max_frame_bytes,
            outbound,
        });
        session.send_message(
            ProtoCmd::IpcStreamAuthHandshake,
            &ProtoIpcStreamAuthHandshake {
                app_id: self.config.app_id.clone().into_bytes(),
            },
        )?;
        session.send_message(
            ProtoCmd::CsReqExample,
            &ProtoCsReqExample {
                test_context: self.config.example_context.clone().into_bytes(),
            },
        )?;
        self.session.set(session);

        let result = self.read_frames(reader).await;
        writer_task.abort();
        result
    }

    async fn read_frames(&self, mut reader: OwnedReadHalf) -> Result<()> {
        let mut buf = BytesMut::with_capacity(8 * 1024);
        loop {
            while let Some(body) = decode_frame(&mut buf, self.config.max_frame_bytes)? {
                let package = match decode_package(&body) {
                    Ok(package) => package,
                    Err(err) => {
                        warn!(error = %err, "dropping undecodable package");
                        continue;
                    }
                };
                debug!(cmd = package.cmd, len = package.protocol.len(), "received package");
                self.worker.push(Envelope::from(package)).await?;
            }

            if reader.read_buf(&mut buf).await? == 0 {
                return Ok(());
            }
        }
    }
}

/// Shutdown was requested or its sender is gone
fn stopping(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

async fn write_frames(
    mut writer: OwnedWriteHalf,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(err) = writer.write_all(&frame).await {
            warn!(error = %err, "rpc write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}
