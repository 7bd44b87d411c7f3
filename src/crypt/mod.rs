//! # Cipher Engine
//!
//! The per-connection payload transforms and the rolling state that drives
//! them.
//!
//! ## Components
//! - **Rolling**: the 16-bit per-direction sequence/IV generator
//! - **Cipher**: stream (XOR) and block (AES-256-OFB) payload transforms
//! - **Diffuse**: the optional region/version diffusion pass
//!
//! Both peers must advance identical rolling state per frame; the engine is
//! deliberately free of randomness after the handshake seed exchange.

pub mod cipher;
pub mod diffuse;
pub mod rolling;

pub use cipher::PacketCipher;
pub use rolling::RollingSeq;
