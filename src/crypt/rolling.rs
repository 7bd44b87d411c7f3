//! Rolling per-direction sequence state.
//!
//! Each direction of a connection carries a 16-bit value that advances after
//! every frame. Both peers seed it from the hello exchange and then evolve it
//! in lockstep; there is no resynchronization protocol, so divergence is
//! unrecoverable and surfaces as garbage frames on the next read.
//!
//! The value is used two ways:
//! - it obfuscates the header length field (`obf_len = len ^ seq`) outside
//!   stream-cipher mode, and
//! - it expands into the block cipher IV for that frame.

use aes::cipher::consts::U16;
use aes::cipher::generic_array::GenericArray;

/// Full-period 16-bit LCG step. Pure function of the previous state: both
/// peers must compute the identical successor from the same seed.
#[inline]
fn step(value: u16) -> u16 {
    value.wrapping_mul(0x6D2D).wrapping_add(0x1369)
}

/// One direction's evolving sequence/IV state.
///
/// Exclusively owned by the side of the session that drives that direction;
/// never shared across connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingSeq {
    value: u16,
}

impl RollingSeq {
    pub fn new(seed: u16) -> Self {
        Self { value: seed }
    }

    /// Current sequence value, as carried in the frame header.
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Advance to the next state. Called exactly once per framed packet.
    pub fn advance(&mut self) {
        self.value = step(self.value);
    }

    /// Expand the current value into a 16-byte block cipher IV: the
    /// little-endian bytes repeated across the block.
    pub fn iv(&self) -> GenericArray<u8, U16> {
        let b = self.value.to_le_bytes();
        let mut iv = [0u8; 16];
        for chunk in iv.chunks_exact_mut(2) {
            chunk.copy_from_slice(&b);
        }
        iv.into()
    }

    /// Repeating XOR key for stream-cipher mode, derived from the same
    /// state the block mode feeds its IV from.
    pub fn xor_key(&self) -> [u8; 4] {
        let b = self.value.to_le_bytes();
        [b[0], b[1], b[0] ^ 0xFF, b[1] ^ 0xFF]
    }
}
