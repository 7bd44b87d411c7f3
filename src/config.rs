//! # Configuration Management
//!
//! Deployment configuration for the protocol core.
//!
//! A single immutable [`ProtocolConfig`] value is constructed once (from TOML
//! or directly) and shared by `Arc` with every component that consults it:
//! the cipher engine, the frame codec, the session layer. There is no
//! process-wide mutable state.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Direct instantiation with defaults
//!
//! The region and version fields select the cipher mode details (key cycling,
//! diffusion pass, opcode width) exactly the way the legacy deployments did.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fixed frame header size on the wire: `[u16 seq][u16 obfuscated length]`.
pub const HEADER_LEN: usize = 4;

/// Default cap on the declared body length of a single frame.
pub const MAX_FRAME_LEN: usize = 1456;

/// AES-256 key length enforced by `validate()`.
pub const KEY_LEN: usize = 32;

/// Number of entries in the default rotating key table.
pub const CYCLE_TABLE_LEN: usize = 20;

/// Deployment region. Ordering matters: the diffusion pass is keyed on
/// comparisons against [`Region::Taiwan`] (see `crypt::diffuse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    Korea,
    Japan,
    China,
    Taiwan,
    Thailand,
    Vietnam,
    Brazil,
}

/// Which payload transform a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// Repeating-key XOR of the payload. Header length obfuscation is
    /// disabled in this mode; the two layers were never combined.
    Stream,
    /// AES-256-OFB over the payload with a rolling per-frame IV.
    #[default]
    Block,
}

/// Immutable per-deployment protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Payload cipher selection.
    pub cipher: CipherMode,

    /// Static cipher key, used when `key_cycling` is off.
    pub key: Vec<u8>,

    /// Select the frame key as `cycle_keys[version % cycle_keys.len()]`
    /// instead of the static `key`.
    pub key_cycling: bool,

    /// Rotating key table consulted when `key_cycling` is on.
    pub cycle_keys: Vec<Vec<u8>>,

    /// Deployment region; selects the diffusion pass and text charset.
    pub region: Region,

    /// Client protocol version; selects the cycling key index and gates
    /// the diffusion pass for older China builds.
    pub version: u16,

    /// Patch/minor version string advertised in the hello frame.
    pub patch_version: String,

    /// Cap on the declared body length of one frame. Anything larger is a
    /// protocol error and closes the connection.
    pub max_frame_len: usize,

    /// Older builds route packets by a single opcode byte instead of u16.
    pub single_byte_opcode: bool,

    /// Heartbeat request opcode the session answers internally.
    pub alive_req_opcode: u16,
    /// Heartbeat response opcode.
    pub alive_ack_opcode: u16,
    /// Redirect-to-other-host opcode used by `Session::migrate`.
    pub migrate_opcode: u16,

    /// Pinned handshake seeds `(recv, send)` from the client's point of
    /// view. `None` means the server draws fresh seeds per connection.
    pub seeds: Option<(u16, u16)>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            cipher: CipherMode::Block,
            key: vec![0x52; KEY_LEN],
            key_cycling: false,
            cycle_keys: default_cycle_keys(),
            region: Region::Global,
            version: 95,
            patch_version: "1".to_string(),
            max_frame_len: MAX_FRAME_LEN,
            single_byte_opcode: false,
            alive_req_opcode: 0x0018,
            alive_ack_opcode: 0x0011,
            migrate_opcode: 0x0010,
            seeds: None,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check key material and limits before the config is shared out.
    pub fn validate(&self) -> Result<()> {
        if self.cipher == CipherMode::Block && self.key.len() != KEY_LEN {
            return Err(ProtocolError::ConfigError(format!(
                "static key must be {KEY_LEN} bytes, got {}",
                self.key.len()
            )));
        }
        if self.key_cycling {
            if self.cycle_keys.is_empty() {
                return Err(ProtocolError::ConfigError(
                    "key cycling enabled with an empty key table".to_string(),
                ));
            }
            if let Some(bad) = self.cycle_keys.iter().find(|k| k.len() != KEY_LEN) {
                return Err(ProtocolError::ConfigError(format!(
                    "cycle key must be {KEY_LEN} bytes, got {}",
                    bad.len()
                )));
            }
        }
        if self.max_frame_len == 0 || self.max_frame_len > u16::MAX as usize {
            return Err(ProtocolError::ConfigError(format!(
                "max_frame_len must fit the u16 header length field, got {}",
                self.max_frame_len
            )));
        }
        Ok(())
    }

    /// Key used for block-cipher frames under this configuration.
    pub fn frame_key(&self) -> &[u8] {
        if self.key_cycling {
            let idx = self.version as usize % self.cycle_keys.len();
            &self.cycle_keys[idx]
        } else {
            &self.key
        }
    }

    /// True when the payload runs the stream (XOR) cipher, which also
    /// disables header length obfuscation.
    pub fn is_stream_cipher(&self) -> bool {
        self.cipher == CipherMode::Stream
    }

    /// True when this region/version combination layers the diffusion pass
    /// over the block cipher.
    pub fn uses_diffusion(&self) -> bool {
        self.region > Region::Taiwan || (self.region == Region::China && self.version < 86)
    }
}

/// Built-in rotating key table. Deterministic filler keys; deployments
/// override this from configuration with their real material.
pub fn default_cycle_keys() -> Vec<Vec<u8>> {
    (0..CYCLE_TABLE_LEN as u8)
        .map(|i| {
            (0..KEY_LEN as u8)
                .map(|j| i.wrapping_mul(0x1F) ^ j.wrapping_mul(0x3B) ^ 0xA7)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        ProtocolConfig::default().validate().unwrap();
    }

    #[test]
    fn toml_roundtrip_overrides() {
        let cfg = ProtocolConfig::from_toml(
            r#"
            cipher = "stream"
            region = "china"
            version = 79
            max_frame_len = 1024
            single_byte_opcode = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cipher, CipherMode::Stream);
        assert_eq!(cfg.region, Region::China);
        assert_eq!(cfg.version, 79);
        assert_eq!(cfg.max_frame_len, 1024);
        assert!(cfg.single_byte_opcode);
    }

    #[test]
    fn short_key_rejected() {
        let cfg = ProtocolConfig {
            key: vec![1, 2, 3],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cycling_needs_full_length_keys() {
        let cfg = ProtocolConfig {
            key_cycling: true,
            cycle_keys: vec![vec![0u8; 16]],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn diffusion_gate_matches_legacy_rule() {
        let mut cfg = ProtocolConfig {
            region: Region::China,
            version: 85,
            ..Default::default()
        };
        assert!(cfg.uses_diffusion());
        cfg.version = 86;
        assert!(!cfg.uses_diffusion());
        cfg.region = Region::Thailand;
        assert!(cfg.uses_diffusion());
        cfg.region = Region::Global;
        assert!(!cfg.uses_diffusion());
    }

    #[test]
    fn cycle_index_wraps_by_version() {
        let cfg = ProtocolConfig {
            key_cycling: true,
            version: CYCLE_TABLE_LEN as u16 + 3,
            ..Default::default()
        };
        assert_eq!(cfg.frame_key(), cfg.cycle_keys[3].as_slice());
    }
}
