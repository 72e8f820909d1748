//! Configuration for the resource subsystem.
//!
//! Loaded from JSON strings (file IO left to the app). Every field has a
//! default, so `{}` is a valid config.

use serde::{Deserialize, Serialize};

use crate::string_id::{DEFAULT_ARENA_BYTES, DEFAULT_STRING_SLOTS};
use crate::texture::TextureOptions;

/// Capacities and decode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsrcConfig {
    /// String table lookup slots.
    #[serde(default = "default_string_slots")]
    pub string_slots: usize,
    /// Bytes reserved for persisted names.
    #[serde(default = "default_arena_bytes")]
    pub arena_bytes: usize,
    #[serde(default = "default_max_resources")]
    pub max_meshes: usize,
    #[serde(default = "default_max_resources")]
    pub max_textures: usize,
    #[serde(default = "default_max_resources")]
    pub max_fonts: usize,
    #[serde(default = "default_flip")]
    pub flip_textures_vertically: bool,
    /// Force decoded textures to this many channels.
    #[serde(default)]
    pub texture_channels: Option<u8>,
    /// Root directory for [`crate::file::DirProvider`].
    #[serde(default = "default_asset_root")]
    pub asset_root: String,
}

fn default_string_slots() -> usize {
    DEFAULT_STRING_SLOTS
}

fn default_arena_bytes() -> usize {
    DEFAULT_ARENA_BYTES
}

fn default_max_resources() -> usize {
    128
}

fn default_flip() -> bool {
    true
}

fn default_asset_root() -> String {
    "assets".to_string()
}

impl Default for RsrcConfig {
    fn default() -> Self {
        Self {
            string_slots: default_string_slots(),
            arena_bytes: default_arena_bytes(),
            max_meshes: default_max_resources(),
            max_textures: default_max_resources(),
            max_fonts: default_max_resources(),
            flip_textures_vertically: default_flip(),
            texture_channels: None,
            asset_root: default_asset_root(),
        }
    }
}

impl RsrcConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn texture_options(&self) -> TextureOptions {
        TextureOptions {
            flip_vertically: self.flip_textures_vertically,
            channels: self.texture_channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        assert_eq!(RsrcConfig::from_json_str("{}").unwrap(), RsrcConfig::default());
    }

    #[test]
    fn partial_json_overrides() {
        let cfg = RsrcConfig::from_json_str(
            r#"{ "max_meshes": 4, "texture_channels": 4, "flip_textures_vertically": false }"#,
        )
        .unwrap();
        assert_eq!(cfg.max_meshes, 4);
        assert_eq!(cfg.max_fonts, 128);
        assert_eq!(cfg.string_slots, 7717);
        assert_eq!(
            cfg.texture_options(),
            TextureOptions {
                flip_vertically: false,
                channels: Some(4),
            }
        );
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(RsrcConfig::from_json_str("{ \"max_meshes\": -1 }").is_err());
    }
}
