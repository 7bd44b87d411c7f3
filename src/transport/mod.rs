//! # Transport Boundary
//!
//! The TCP accept loop that feeds connections into the session layer.

pub mod tcp;

pub use tcp::{serve, serve_with_shutdown};
