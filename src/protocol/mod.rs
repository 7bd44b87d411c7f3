//! # Session Layer
//!
//! Connection lifecycle on top of the frame codec.
//!
//! ## Components
//! - **Session**: read loop, serialized send path, heartbeat and migration
//! - **Handshake**: the plaintext hello frame and seed exchange
//! - **Diagnostics**: opcode-table packet logging

pub mod diagnostics;
pub mod handshake;
pub mod session;

pub use diagnostics::OpcodeTable;
pub use session::{Session, SessionDelegate};
