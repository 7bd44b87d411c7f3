//! In/out packet buffers with cursor-based field codecs.
//!
//! [`InPacket`] wraps one decrypted frame body and hands out fields from a
//! read cursor; [`OutPacket`] is the append-only mirror. All integers are
//! little-endian. Reads that would run past the end return the zero value
//! without advancing, matching the legacy stack's tolerance for truncated
//! fields; the underrun is logged but never fails the packet.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::locale::TextCodec;

/// Offset between the FILETIME epoch (1601-01-01) and the Unix epoch, in
/// 100-nanosecond ticks.
const FILETIME_UNIX_DIFF: i64 = 116_444_736_000_000_000;

/// Fixed width of character-name fields on the wire.
const NAME_FIELD_LEN: usize = 13;

/// One received frame body with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct InPacket {
    buf: Vec<u8>,
    offset: usize,
}

impl InPacket {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Peek the routing opcode (first two bytes, little-endian) without
    /// moving the cursor. Zero if the frame is shorter than two bytes.
    pub fn opcode(&self) -> u16 {
        if self.buf.len() >= 2 {
            u16::from_le_bytes([self.buf[0], self.buf[1]])
        } else {
            0
        }
    }

    /// Peek the single-byte routing opcode without moving the cursor.
    pub fn opcode_byte(&self) -> u8 {
        self.buf.first().copied().unwrap_or(0)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.remaining() < N {
            warn!(
                needed = N,
                remaining = self.remaining(),
                "decode underrun, returning zero value"
            );
            return None;
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.offset..self.offset + N]);
        self.offset += N;
        Some(out)
    }

    pub fn decode_u8(&mut self) -> u8 {
        self.take::<1>().map(|b| b[0]).unwrap_or(0)
    }

    pub fn decode_i8(&mut self) -> i8 {
        self.decode_u8() as i8
    }

    pub fn decode_u16(&mut self) -> u16 {
        self.take::<2>().map(u16::from_le_bytes).unwrap_or(0)
    }

    pub fn decode_i16(&mut self) -> i16 {
        self.decode_u16() as i16
    }

    pub fn decode_u32(&mut self) -> u32 {
        self.take::<4>().map(u32::from_le_bytes).unwrap_or(0)
    }

    pub fn decode_i32(&mut self) -> i32 {
        self.decode_u32() as i32
    }

    pub fn decode_u64(&mut self) -> u64 {
        self.take::<8>().map(u64::from_le_bytes).unwrap_or(0)
    }

    pub fn decode_i64(&mut self) -> i64 {
        self.decode_u64() as i64
    }

    pub fn decode_bool(&mut self) -> bool {
        self.decode_u8() == 1
    }

    /// Read a FILETIME field: signed 100-nanosecond ticks since 1601.
    pub fn decode_file_time(&mut self) -> SystemTime {
        let ticks = self.decode_i64();
        let nanos = (ticks - FILETIME_UNIX_DIFF).saturating_mul(100);
        if nanos >= 0 {
            UNIX_EPOCH + Duration::from_nanos(nanos as u64)
        } else {
            UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs())
        }
    }

    /// Read a u16-length-prefixed string. Empty when either the prefix or
    /// the body runs past the end; consumed bytes up to the failed check
    /// stay consumed.
    pub fn decode_str(&mut self) -> String {
        if self.remaining() < 2 {
            warn!(remaining = self.remaining(), "string length prefix underrun");
            return String::new();
        }
        let len = self.decode_u16() as usize;
        if self.remaining() < len {
            warn!(
                needed = len,
                remaining = self.remaining(),
                "string body underrun"
            );
            return String::new();
        }
        let start = self.offset;
        self.offset += len;
        String::from_utf8_lossy(&self.buf[start..self.offset]).into_owned()
    }

    /// Read a u16-length-prefixed string through the region text codec.
    pub fn decode_locale_str(&mut self, codec: &dyn TextCodec) -> String {
        let len = self.decode_u16() as usize;
        let raw = self.decode_buffer(len);
        codec.decode(&raw)
    }

    /// Read a fixed 13-byte character-name field through the region text
    /// codec.
    pub fn decode_locale_name(&mut self, codec: &dyn TextCodec) -> String {
        let raw = self.decode_buffer(NAME_FIELD_LEN);
        codec.decode(&raw)
    }

    /// Copy out the next `n` bytes. Empty when `n` is zero or more than
    /// what remains.
    pub fn decode_buffer(&mut self, n: usize) -> Vec<u8> {
        if n == 0 {
            return Vec::new();
        }
        if self.remaining() < n {
            warn!(
                needed = n,
                remaining = self.remaining(),
                "buffer decode underrun"
            );
            return Vec::new();
        }
        let start = self.offset;
        self.offset += n;
        self.buf[start..self.offset].to_vec()
    }

    /// Render the first `min(n, len)` bytes as uppercase hex pairs; `n == 0`
    /// dumps the whole frame. Diagnostic only, the cursor is untouched.
    pub fn dump_hex(&self, n: usize) -> String {
        dump_hex(&self.buf, n)
    }

    /// Logical clear: drops length and cursor back to zero.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.offset = 0;
    }
}

/// One outbound frame body under construction.
#[derive(Debug, Clone, Default)]
pub struct OutPacket {
    buf: Vec<u8>,
}

impl OutPacket {
    /// Start a packet with a two-byte opcode.
    pub fn new(opcode: u16) -> Self {
        let mut p = Self { buf: Vec::with_capacity(32) };
        p.encode_u16(opcode);
        p
    }

    /// Start a packet with a single-byte opcode (older builds).
    pub fn with_byte_opcode(opcode: u8) -> Self {
        let mut p = Self { buf: Vec::with_capacity(32) };
        p.encode_u8(opcode);
        p
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn opcode(&self) -> u16 {
        if self.buf.len() >= 2 {
            u16::from_le_bytes([self.buf[0], self.buf[1]])
        } else {
            0
        }
    }

    pub fn opcode_byte(&self) -> u8 {
        self.buf.first().copied().unwrap_or(0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn encode_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn encode_i8(&mut self, v: i8) {
        self.encode_u8(v as u8);
    }

    pub fn encode_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn encode_i16(&mut self, v: i16) {
        self.encode_u16(v as u16);
    }

    pub fn encode_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn encode_i32(&mut self, v: i32) {
        self.encode_u32(v as u32);
    }

    pub fn encode_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn encode_i64(&mut self, v: i64) {
        self.encode_u64(v as u64);
    }

    pub fn encode_bool(&mut self, v: bool) {
        self.encode_u8(v as u8);
    }

    /// Write a FILETIME field from a standard time value.
    pub fn encode_file_time(&mut self, t: SystemTime) {
        let nanos = match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_nanos() as i128,
            Err(e) => -(e.duration().as_nanos() as i128),
        };
        let ticks = (nanos / 100) as i64 + FILETIME_UNIX_DIFF;
        self.encode_i64(ticks);
    }

    /// Write a u16-length-prefixed string.
    pub fn encode_str(&mut self, s: &str) {
        self.encode_u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Write a u16-length-prefixed string through the region text codec.
    pub fn encode_locale_str(&mut self, s: &str, codec: &dyn TextCodec) {
        let raw = codec.encode(s);
        self.encode_u16(raw.len() as u16);
        self.buf.extend_from_slice(&raw);
    }

    /// Write a fixed 13-byte character-name field, zero-padded or truncated.
    pub fn encode_locale_name(&mut self, s: &str, codec: &dyn TextCodec) {
        let mut raw = codec.encode(s);
        raw.resize(NAME_FIELD_LEN, 0);
        self.buf.extend_from_slice(&raw[..NAME_FIELD_LEN]);
    }

    pub fn encode_buffer(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
    }

    /// Same diagnostic rendering as [`InPacket::dump_hex`].
    pub fn dump_hex(&self, n: usize) -> String {
        dump_hex(&self.buf, n)
    }
}

fn dump_hex(buf: &[u8], n: usize) -> String {
    let n = if n == 0 || n > buf.len() { buf.len() } else { n };
    let mut out = String::with_capacity(n * 3);
    for (i, b) in buf[..n].iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Passthrough;

    #[test]
    fn hello_string_advances_cursor_by_seven() {
        let mut p = InPacket::new(vec![0x05, 0x00, 0x48, 0x65, 0x6C, 0x6C, 0x6F]);
        assert_eq!(p.decode_str(), "Hello");
        assert_eq!(p.offset(), 7);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn opcode_peek_does_not_consume() {
        let p = InPacket::new(vec![0x18, 0x00, 0x01]);
        assert_eq!(p.opcode(), 0x0018);
        assert_eq!(p.opcode_byte(), 0x18);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn underrun_returns_zero_without_advancing() {
        let mut p = InPacket::new(vec![0xAB]);
        assert_eq!(p.decode_u32(), 0);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.decode_u8(), 0xAB);
        assert_eq!(p.decode_u8(), 0);
        assert_eq!(p.offset(), 1);
    }

    #[test]
    fn truncated_string_body_yields_empty() {
        // Prefix claims 10 bytes, only 2 present; the prefix itself stays
        // consumed, as the original stack behaves.
        let mut p = InPacket::new(vec![0x0A, 0x00, 0x41, 0x42]);
        assert_eq!(p.decode_str(), "");
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn clear_is_terminal() {
        let mut p = InPacket::new(vec![1, 2, 3, 4]);
        p.decode_u16();
        p.clear();
        assert_eq!(p.remaining(), 0);
        assert_eq!(p.decode_u32(), 0);
        assert_eq!(p.decode_str(), "");
    }

    #[test]
    fn file_time_roundtrip() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let mut out = OutPacket::new(0);
        out.encode_file_time(t);
        let mut inp = InPacket::new(out.into_bytes());
        inp.decode_u16();
        assert_eq!(inp.decode_file_time(), t);
    }

    #[test]
    fn file_time_before_unix_epoch() {
        // 1601-01-01 itself: tick count zero.
        let mut p = InPacket::new(0i64.to_le_bytes().to_vec());
        let t = p.decode_file_time();
        assert!(t < UNIX_EPOCH);
    }

    #[test]
    fn locale_name_fixed_width() {
        let codec = Passthrough;
        let mut out = OutPacket::new(1);
        out.encode_locale_name("Ayla", &codec);
        assert_eq!(out.len(), 2 + 13);

        let mut inp = InPacket::new(out.into_bytes());
        inp.decode_u16();
        let name = inp.decode_locale_name(&codec);
        assert!(name.starts_with("Ayla"));
        assert_eq!(inp.remaining(), 0);
    }

    #[test]
    fn buffer_decode_bounds() {
        let mut p = InPacket::new(vec![1, 2, 3]);
        assert_eq!(p.decode_buffer(0), Vec::<u8>::new());
        assert_eq!(p.decode_buffer(4), Vec::<u8>::new());
        assert_eq!(p.decode_buffer(3), vec![1, 2, 3]);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn hex_dump_formats_and_truncates() {
        let p = InPacket::new(vec![0xAA, 0x01, 0x10, 0x00]);
        assert_eq!(p.dump_hex(0), "AA 01 10 00");
        assert_eq!(p.dump_hex(2), "AA 01");
        assert_eq!(p.dump_hex(99), "AA 01 10 00");
    }
}
