//! # Core Protocol Components
//!
//! The packet container and the wire framing.
//!
//! ## Components
//! - **Packet**: cursor-based field codec over one frame body
//! - **Codec**: frame header handling and stream reassembly
//!
//! ## Wire Format
//! ```text
//! [Seq(2)] [ObfLen(2)] [Ciphertext(N)]
//! ```
//!
//! ## Safety
//! - Declared length is validated against the configured cap before any
//!   body allocation
//! - Field decodes never read past the frame; underruns yield zero values

pub mod codec;
pub mod packet;

pub use codec::{FrameDecoder, FrameEncoder, Header};
pub use packet::{InPacket, OutPacket};
