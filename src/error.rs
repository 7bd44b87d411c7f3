//! # Error Types
//!
//! Error handling for the protocol core.
//!
//! This module defines all error variants that can occur between the raw
//! byte stream and a dispatched packet, from I/O failures to protocol
//! violations in the frame header.
//!
//! ## Error Categories
//! - **I/O Errors**: transport read/write failures
//! - **Protocol Errors**: malformed headers, oversized frames
//! - **Session Errors**: handshake and lifecycle failures
//!
//! Every error here is fatal to its connection; the protocol has no retry
//! or resynchronization path (see the crate docs on sequence state).

use std::io;
use thiserror::Error;

/// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid frame header")]
    InvalidHeader,

    #[error("Frame too large: {0} bytes declared")]
    OversizedFrame(usize),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Handshake failed: {0}")]
    HandshakeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
