//! # gamewire
//!
//! Session core for a legacy client-server game protocol: fixed-header,
//! length-obfuscated frames over TCP, protected by a per-connection
//! rolling-key cipher that must stay bit-for-bit synchronized between both
//! peers for the life of a session.
//!
//! ## Layers
//! - [`core::packet`]: cursor-based field codec over one frame body
//! - [`crypt`]: stream/block payload ciphers driven by the rolling
//!   sequence state, plus the regional diffusion pass
//! - [`core::codec`]: frame header obfuscation and stream reassembly
//! - [`protocol::session`]: connection lifecycle, read loop, serialized
//!   sends, heartbeat and migration
//! - [`transport::tcp`]: the accept loop boundary
//!
//! ## Wire Format
//! ```text
//! [Seq(2)] [ObfLen(2)] [Ciphertext(N)]    little-endian
//! ```
//!
//! ## Synchronization
//! Both directions carry independent rolling sequence state, seeded by the
//! plaintext hello and advanced deterministically per frame. There is no
//! resynchronization protocol: any divergence surfaces as garbage frames
//! and closes the connection.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use gamewire::config::ProtocolConfig;
//! use gamewire::core::packet::{InPacket, OutPacket};
//! use gamewire::protocol::{OpcodeTable, Session, SessionDelegate};
//!
//! struct Login;
//!
//! #[async_trait]
//! impl SessionDelegate for Login {
//!     async fn process_packet(&self, session: &Session, mut packet: InPacket) -> bool {
//!         if packet.opcode() != 0x0001 {
//!             return false;
//!         }
//!         packet.decode_u16();
//!         let account = packet.decode_str();
//!         let mut reply = OutPacket::new(0x0000);
//!         reply.encode_u8(0);
//!         reply.encode_str(&account);
//!         session.send_packet(reply).await.is_ok()
//!     }
//!
//!     fn socket_closed(&self, id: u32) {
//!         tracing::info!(id, "socket closed");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> gamewire::error::Result<()> {
//!     let config = Arc::new(ProtocolConfig::default());
//!     gamewire::transport::serve("0.0.0.0:8484", config, Arc::new(Login), Arc::new(OpcodeTable::new())).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod crypt;
pub mod error;
pub mod locale;
pub mod protocol;
pub mod transport;

pub use config::{CipherMode, ProtocolConfig, Region};
pub use self::core::{FrameDecoder, FrameEncoder, Header, InPacket, OutPacket};
pub use crypt::{PacketCipher, RollingSeq};
pub use error::{ProtocolError, Result};
pub use locale::{Passthrough, TextCodec};
pub use protocol::{OpcodeTable, Session, SessionDelegate};
