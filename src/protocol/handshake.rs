//! Plaintext hello frame.
//!
//! The first bytes on a fresh connection are unciphered and carry the seeds
//! both rolling sequences start from; everything after it runs through the
//! frame codec. Layout, from the client's point of view:
//!
//! ```text
//! [u16 body_len] [u16 version] [str patch] [u16 recv_seed] [u16 send_seed] [u8 region]
//! ```
//!
//! The client's receive seed is the server's send seed and vice versa; once
//! this frame is on the wire, both sides evolve the state without further
//! coordination.

use crate::config::ProtocolConfig;
use crate::core::packet::{InPacket, OutPacket};
use crate::error::{ProtocolError, Result};

/// Decoded hello, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    pub version: u16,
    pub patch: String,
    /// Seeds the client's frame decoder (the server's encoder).
    pub recv_seed: u16,
    /// Seeds the client's frame encoder (the server's decoder).
    pub send_seed: u16,
    pub region: u8,
}

/// Seeds for one connection: `(client_recv, client_send)`. Pinned by
/// configuration when present, otherwise drawn fresh per connection.
pub fn draw_seeds(config: &ProtocolConfig) -> (u16, u16) {
    config.seeds.unwrap_or_else(|| (rand::random(), rand::random()))
}

/// Build the full hello frame, length prefix included.
pub fn encode_hello(config: &ProtocolConfig, client_recv_seed: u16, client_send_seed: u16) -> Vec<u8> {
    let mut body = OutPacket::default();
    body.encode_u16(config.version);
    body.encode_str(&config.patch_version);
    body.encode_u16(client_recv_seed);
    body.encode_u16(client_send_seed);
    body.encode_u8(config.region as u8);

    let mut frame = Vec::with_capacity(2 + body.len());
    frame.extend_from_slice(&(body.len() as u16).to_le_bytes());
    frame.extend_from_slice(body.as_bytes());
    frame
}

/// Decode a hello body (the bytes after the length prefix).
pub fn decode_hello(body: &[u8]) -> Result<Hello> {
    // version(2) + patch prefix(2) + seeds(4) + region(1)
    if body.len() < 9 {
        return Err(ProtocolError::HandshakeError(format!(
            "hello body too short: {} bytes",
            body.len()
        )));
    }
    let mut p = InPacket::new(body.to_vec());
    let version = p.decode_u16();
    let patch = p.decode_str();
    let recv_seed = p.decode_u16();
    let send_seed = p.decode_u16();
    let region = p.decode_u8();
    if p.remaining() != 0 {
        return Err(ProtocolError::HandshakeError(format!(
            "hello body has {} trailing bytes",
            p.remaining()
        )));
    }
    Ok(Hello {
        version,
        patch,
        recv_seed,
        send_seed,
        region,
    })
}
