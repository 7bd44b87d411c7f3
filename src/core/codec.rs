//! Frame assembly over the byte stream.
//!
//! Wire format, little-endian throughout:
//!
//! ```text
//! [u16 seq] [u16 obf_len] [ciphertext of true_len bytes]
//! ```
//!
//! `obf_len` is the true body length XORed with `seq`, except in
//! stream-cipher deployments where the length rides in the clear; the two
//! obfuscation layers were never combined. A declared length above the
//! configured cap is a protocol error and closes the connection.
//!
//! [`FrameDecoder`] and [`FrameEncoder`] each own one direction's
//! [`RollingSeq`] and plug into `tokio_util`'s `FramedRead`/`FramedWrite`,
//! so partial frames across arbitrarily fragmented reads are handled by the
//! accumulation buffer.

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::config::{ProtocolConfig, HEADER_LEN};
use crate::core::packet::{InPacket, OutPacket};
use crate::crypt::{PacketCipher, RollingSeq};
use crate::error::ProtocolError;

/// Parsed 4-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Rolling sequence value as sent by the peer.
    pub seq: u16,
    /// True body length, after de-obfuscation.
    pub len: u16,
}

impl Header {
    /// Encode for the wire. `plain_len` skips the length XOR, as
    /// stream-cipher deployments do.
    pub fn encode(&self, plain_len: bool) -> [u8; HEADER_LEN] {
        let obf = if plain_len { self.len } else { self.len ^ self.seq };
        let mut raw = [0u8; HEADER_LEN];
        raw[..2].copy_from_slice(&self.seq.to_le_bytes());
        raw[2..].copy_from_slice(&obf.to_le_bytes());
        raw
    }

    /// Decode from the wire, inverting the length obfuscation with the
    /// sequence value carried in the header itself.
    pub fn decode(raw: [u8; HEADER_LEN], plain_len: bool) -> Self {
        let seq = u16::from_le_bytes([raw[0], raw[1]]);
        let obf = u16::from_le_bytes([raw[2], raw[3]]);
        let len = if plain_len { obf } else { obf ^ seq };
        Self { seq, len }
    }
}

/// Inbound half: raw bytes in, decrypted [`InPacket`]s out.
#[derive(Debug)]
pub struct FrameDecoder {
    config: Arc<ProtocolConfig>,
    cipher: PacketCipher,
    seq: RollingSeq,
    /// Header already parsed, body still arriving.
    pending: Option<Header>,
}

impl FrameDecoder {
    pub fn new(config: Arc<ProtocolConfig>, seed: u16) -> Self {
        let cipher = PacketCipher::from_config(&config);
        Self {
            config,
            cipher,
            seq: RollingSeq::new(seed),
            pending: None,
        }
    }

    /// Current receive-direction sequence value.
    pub fn seq(&self) -> u16 {
        self.seq.value()
    }
}

impl Decoder for FrameDecoder {
    type Item = InPacket;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<InPacket>, ProtocolError> {
        if self.pending.is_none() {
            if src.len() < HEADER_LEN {
                return Ok(None);
            }
            let mut raw = [0u8; HEADER_LEN];
            raw.copy_from_slice(&src[..HEADER_LEN]);
            let header = Header::decode(raw, self.config.is_stream_cipher());
            if header.len as usize > self.config.max_frame_len {
                // Oversized claim: either an attack or sequence desync.
                // Both are fatal to the connection.
                return Err(ProtocolError::OversizedFrame(header.len as usize));
            }
            src.advance(HEADER_LEN);
            src.reserve(header.len as usize);
            self.pending = Some(header);
        }

        let header = match self.pending {
            Some(h) => h,
            None => return Ok(None),
        };
        if src.len() < header.len as usize {
            return Ok(None);
        }
        self.pending = None;

        let mut body = src.split_to(header.len as usize).to_vec();
        self.cipher
            .decrypt(&mut body, header.len as usize, self.config.max_frame_len, &self.seq);
        self.seq.advance();
        trace!(seq = header.seq, len = header.len, "frame ready");
        Ok(Some(InPacket::new(body)))
    }
}

/// Outbound half: [`OutPacket`]s in, `header || ciphertext` out.
#[derive(Debug)]
pub struct FrameEncoder {
    config: Arc<ProtocolConfig>,
    cipher: PacketCipher,
    seq: RollingSeq,
}

impl FrameEncoder {
    pub fn new(config: Arc<ProtocolConfig>, seed: u16) -> Self {
        let cipher = PacketCipher::from_config(&config);
        Self {
            config,
            cipher,
            seq: RollingSeq::new(seed),
        }
    }

    /// Current send-direction sequence value.
    pub fn seq(&self) -> u16 {
        self.seq.value()
    }
}

impl Encoder<OutPacket> for FrameEncoder {
    type Error = ProtocolError;

    fn encode(&mut self, packet: OutPacket, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let mut body = packet.into_bytes();
        if body.len() > self.config.max_frame_len {
            return Err(ProtocolError::OversizedFrame(body.len()));
        }

        let header = Header {
            seq: self.seq.value(),
            len: body.len() as u16,
        };
        self.cipher.encrypt(&mut body, &self.seq);
        self.seq.advance();

        dst.reserve(HEADER_LEN + body.len());
        dst.put_slice(&header.encode(self.config.is_stream_cipher()));
        dst.put_slice(&body);
        trace!(seq = header.seq, len = header.len, "frame emitted");
        Ok(())
    }
}
