//! Payload cipher engine.
//!
//! A deployment runs exactly one of two transforms, chosen once from
//! configuration when the session is set up:
//!
//! - **Stream**: repeating-key XOR against bytes derived from the rolling
//!   state. Cheap, and the only mode where header length obfuscation is off.
//! - **Block**: AES-256-OFB keyed by the static key or the rotating key
//!   table, IV drawn from the rolling state, optionally layered with the
//!   diffusion pass for the region/version combinations that expect it.
//!
//! Both transforms are in place and length-preserving, and `encrypt`/`decrypt`
//! take the direction's [`RollingSeq`] rather than owning it: the session is
//! the sole owner of sequence state.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes256;
use tracing::warn;

use crate::config::ProtocolConfig;
use crate::crypt::diffuse;
use crate::crypt::rolling::RollingSeq;

type Aes256Ofb = ofb::Ofb<Aes256>;

/// The configured payload transform for one connection.
#[derive(Debug, Clone)]
pub enum PacketCipher {
    Stream(XorCipher),
    Block(BlockCipher),
}

impl PacketCipher {
    /// Build the engine once from deployment configuration.
    pub fn from_config(config: &ProtocolConfig) -> Self {
        if config.is_stream_cipher() {
            PacketCipher::Stream(XorCipher)
        } else {
            let mut key = [0u8; 32];
            key.copy_from_slice(config.frame_key());
            PacketCipher::Block(BlockCipher {
                key,
                diffusion: config.uses_diffusion(),
            })
        }
    }

    /// Encrypt a payload in place for the frame at `seq`.
    pub fn encrypt(&self, buf: &mut [u8], seq: &RollingSeq) {
        match self {
            PacketCipher::Stream(c) => c.apply(buf, seq),
            PacketCipher::Block(c) => c.encrypt(buf, seq),
        }
    }

    /// Decrypt a payload in place for the frame at `seq`.
    ///
    /// `declared_len` is the length the frame header claimed. A zero or
    /// over-limit claim leaves the payload untouched with a warning instead
    /// of failing: the legacy stacks kept processing after this guard, and
    /// we preserve that observable behavior (the framing layer is the place
    /// that actually rejects oversized headers).
    pub fn decrypt(&self, buf: &mut [u8], declared_len: usize, max_frame_len: usize, seq: &RollingSeq) {
        if declared_len == 0 || declared_len > max_frame_len {
            warn!(declared_len, max_frame_len, "refusing to decrypt frame with invalid declared length");
            return;
        }
        match self {
            PacketCipher::Stream(c) => c.apply(buf, seq),
            PacketCipher::Block(c) => c.decrypt(buf, seq),
        }
    }
}

/// Repeating-key XOR stream cipher. Self-inverse.
#[derive(Debug, Clone, Copy)]
pub struct XorCipher;

impl XorCipher {
    fn apply(&self, buf: &mut [u8], seq: &RollingSeq) {
        let key = seq.xor_key();
        for (i, b) in buf.iter_mut().enumerate() {
            *b ^= key[i % key.len()];
        }
    }
}

/// AES-256-OFB with a per-frame rolling IV.
#[derive(Clone)]
pub struct BlockCipher {
    key: [u8; 32],
    diffusion: bool,
}

impl std::fmt::Debug for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("BlockCipher")
            .field("diffusion", &self.diffusion)
            .finish_non_exhaustive()
    }
}

impl BlockCipher {
    fn keystream(&self, buf: &mut [u8], seq: &RollingSeq) {
        // OFB is a keystream XOR, so the same call encrypts and decrypts.
        let mut ofb = Aes256Ofb::new(&self.key.into(), &seq.iv());
        ofb.apply_keystream(buf);
    }

    fn encrypt(&self, buf: &mut [u8], seq: &RollingSeq) {
        if self.diffusion {
            diffuse::scramble(buf);
        }
        self.keystream(buf, seq);
    }

    fn decrypt(&self, buf: &mut [u8], seq: &RollingSeq) {
        self.keystream(buf, seq);
        if self.diffusion {
            diffuse::unscramble(buf);
        }
    }
}
