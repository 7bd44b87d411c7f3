//! Per-connection session.
//!
//! A [`Session`] owns one accepted connection end to end: it sends the
//! plaintext hello, runs the read loop that drives the frame decoder, and
//! exposes a send path that is safe to call from any task.
//!
//! ## Concurrency
//! The read half (and with it the receive-direction rolling state) is owned
//! by the read loop task alone. The write half sits behind a `tokio::sync::
//! Mutex`, so concurrent `send_packet` calls serialize and the outbound
//! cipher state advances in exactly the order bytes hit the wire. Closing
//! is the only cancellation mechanism: it wakes the read loop, shuts the
//! transport down and notifies the delegate exactly once.
//!
//! Nothing here retries. Framing, cipher and transport errors all route to
//! a terminal close.

use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

use crate::config::ProtocolConfig;
use crate::core::codec::{FrameDecoder, FrameEncoder};
use crate::core::packet::{InPacket, OutPacket};
use crate::error::{ProtocolError, Result};
use crate::protocol::diagnostics::OpcodeTable;
use crate::protocol::handshake;

/// External collaborator receiving complete decrypted frames.
#[async_trait]
pub trait SessionDelegate: Send + Sync + 'static {
    /// Handle one frame, cursor at frame start. Return `false` when the
    /// opcode is not handled; the session logs and drops the frame.
    async fn process_packet(&self, session: &Session, packet: InPacket) -> bool;

    /// Called exactly once per session, after the transport is torn down.
    fn socket_closed(&self, id: u32);
}

type Writer = FramedWrite<OwnedWriteHalf, FrameEncoder>;
type Reader = FramedRead<OwnedReadHalf, FrameDecoder>;

/// Cheaply clonable handle to one live connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: u32,
    peer: SocketAddr,
    config: Arc<ProtocolConfig>,
    diagnostics: Arc<OpcodeTable>,
    delegate: Arc<dyn SessionDelegate>,
    /// Taken on close; a session never gets its writer back.
    writer: Mutex<Option<Writer>>,
    closed: AtomicBool,
    shutdown: Notify,
}

impl Session {
    /// Take over an accepted connection: send the hello with this
    /// connection's seeds, seed both frame codecs, spawn the read loop.
    pub async fn open(
        mut stream: TcpStream,
        id: u32,
        config: Arc<ProtocolConfig>,
        delegate: Arc<dyn SessionDelegate>,
        diagnostics: Arc<OpcodeTable>,
    ) -> Result<Session> {
        let peer = stream.peer_addr()?;

        let (client_recv_seed, client_send_seed) = handshake::draw_seeds(&config);
        let hello = handshake::encode_hello(&config, client_recv_seed, client_send_seed);
        stream.write_all(&hello).await?;

        // Mirror of the client: our encoder runs on the seed the client
        // decodes with, and vice versa.
        let (rd, wr) = stream.into_split();
        let reader = FramedRead::new(rd, FrameDecoder::new(config.clone(), client_send_seed));
        let writer = FramedWrite::new(wr, FrameEncoder::new(config.clone(), client_recv_seed));

        let session = Session {
            inner: Arc::new(SessionInner {
                id,
                peer,
                config,
                diagnostics,
                delegate,
                writer: Mutex::new(Some(writer)),
                closed: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
        };
        info!(id, peer = %peer, "session opened");

        tokio::spawn(session.clone().read_loop(reader));
        Ok(session)
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.inner.peer
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn routing_opcode(&self, packet: &InPacket) -> u16 {
        if self.inner.config.single_byte_opcode {
            packet.opcode_byte() as u16
        } else {
            packet.opcode()
        }
    }

    #[instrument(skip_all, fields(id = self.inner.id))]
    async fn read_loop(self, mut reader: Reader) {
        loop {
            if self.is_closed() {
                break;
            }
            tokio::select! {
                () = self.inner.shutdown.notified() => break,
                frame = reader.next() => match frame {
                    Some(Ok(packet)) => {
                        if !self.dispatch(packet).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        self.on_error(e).await;
                        break;
                    }
                    None => {
                        debug!("peer closed the connection");
                        break;
                    }
                },
            }
        }
        // Dropping the reader releases the read half; close() handles the
        // rest of the teardown.
        drop(reader);
        self.close().await;
    }

    /// Route one complete frame. Returns `false` when the session should
    /// stop reading.
    async fn dispatch(&self, packet: InPacket) -> bool {
        self.inner
            .diagnostics
            .log_in_packet(self.inner.id, &packet, self.inner.config.single_byte_opcode);

        let opcode = self.routing_opcode(&packet);
        if opcode == self.inner.config.alive_req_opcode {
            if let Err(e) = self.on_alive_req().await {
                self.on_error(e).await;
                return false;
            }
            return true;
        }

        if !self.inner.delegate.process_packet(self, packet).await {
            debug!(opcode = %format!("0x{opcode:04X}"), "unhandled packet");
        }
        !self.is_closed()
    }

    /// Answer the heartbeat request with the configured ack opcode.
    async fn on_alive_req(&self) -> Result<()> {
        let ack = if self.inner.config.single_byte_opcode {
            OutPacket::with_byte_opcode(self.inner.config.alive_ack_opcode as u8)
        } else {
            OutPacket::new(self.inner.config.alive_ack_opcode)
        };
        self.send_packet(ack).await
    }

    /// Encode, encrypt, frame and write one packet. Serialized against all
    /// other senders on this session.
    pub async fn send_packet(&self, packet: OutPacket) -> Result<()> {
        self.inner
            .diagnostics
            .log_out_packet(self.inner.id, &packet, self.inner.config.single_byte_opcode);

        let mut guard = self.inner.writer.lock().await;
        let writer = guard.as_mut().ok_or(ProtocolError::ConnectionClosed)?;
        writer.send(packet).await
    }

    /// Force buffered outbound bytes onto the transport.
    pub async fn flush(&self) -> Result<()> {
        let mut guard = self.inner.writer.lock().await;
        let writer = guard.as_mut().ok_or(ProtocolError::ConnectionClosed)?;
        SinkExt::flush(writer).await
    }

    /// Send the redirect instruction, then hand the connection off by
    /// closing it. A clean handoff, not a retry.
    pub async fn migrate(&self, host: Ipv4Addr, port: u16) -> Result<()> {
        let mut p = if self.inner.config.single_byte_opcode {
            OutPacket::with_byte_opcode(self.inner.config.migrate_opcode as u8)
        } else {
            OutPacket::new(self.inner.config.migrate_opcode)
        };
        p.encode_bool(true);
        p.encode_buffer(&host.octets());
        p.encode_u16(port);
        self.send_packet(p).await?;
        self.close().await;
        Ok(())
    }

    /// Route a transport or protocol failure to a terminal close.
    pub async fn on_error(&self, err: ProtocolError) {
        warn!(id = self.inner.id, error = %err, "session error, closing");
        self.close().await;
    }

    /// Idempotent teardown: wakes the read loop, shuts the write half down,
    /// notifies the delegate exactly once.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.shutdown.notify_waiters();

        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            let _ = SinkExt::flush(&mut writer).await;
            let _ = writer.get_mut().shutdown().await;
        }

        info!(id = self.inner.id, "session closed");
        self.inner.delegate.socket_closed(self.inner.id);
    }
}
