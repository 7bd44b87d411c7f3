//! Packet traffic logging.
//!
//! Purely observational: given an externally supplied opcode-to-name table
//! and a suppress set, render the opcode and a hex dump of each frame. Never
//! touches protocol state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::core::packet::{InPacket, OutPacket};

/// Opcode names and the set of opcodes kept out of the logs (movement,
/// heartbeats and other spam).
#[derive(Debug, Clone, Default)]
pub struct OpcodeTable {
    names: HashMap<u16, String>,
    suppressed: HashSet<u16>,
}

impl OpcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_opcode(&mut self, opcode: u16, name: impl Into<String>) -> &mut Self {
        self.names.insert(opcode, name.into());
        self
    }

    pub fn suppress(&mut self, opcode: u16) -> &mut Self {
        self.suppressed.insert(opcode);
        self
    }

    pub fn name(&self, opcode: u16) -> &str {
        self.names.get(&opcode).map(String::as_str).unwrap_or("UNKNOWN")
    }

    pub fn is_suppressed(&self, opcode: u16) -> bool {
        self.suppressed.contains(&opcode)
    }

    /// Log one inbound frame unless its opcode is suppressed.
    pub fn log_in_packet(&self, id: u32, packet: &InPacket, single_byte_opcode: bool) {
        let opcode = if single_byte_opcode {
            packet.opcode_byte() as u16
        } else {
            packet.opcode()
        };
        if self.is_suppressed(opcode) {
            return;
        }
        debug!(
            id,
            length = packet.len(),
            opcode = %format!("0x{opcode:04X}"),
            name = self.name(opcode),
            data = %packet.dump_hex(0),
            "recv packet"
        );
    }

    /// Log one outbound frame unless its opcode is suppressed.
    pub fn log_out_packet(&self, id: u32, packet: &OutPacket, single_byte_opcode: bool) {
        let opcode = if single_byte_opcode {
            packet.opcode_byte() as u16
        } else {
            packet.opcode()
        };
        if self.is_suppressed(opcode) {
            return;
        }
        debug!(
            id,
            length = packet.len(),
            opcode = %format!("0x{opcode:04X}"),
            name = self.name(opcode),
            data = %packet.dump_hex(0),
            "send packet"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_suppression() {
        let mut table = OpcodeTable::new();
        table.name_opcode(0x0001, "LOGIN_REQ").suppress(0x0018);
        assert_eq!(table.name(0x0001), "LOGIN_REQ");
        assert_eq!(table.name(0x0002), "UNKNOWN");
        assert!(table.is_suppressed(0x0018));
        assert!(!table.is_suppressed(0x0001));
    }
}
