// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding configuration and wire constants.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire constants of the 1.1 encoding (slice flags,
//!   size markers, encapsulation header). Never hardcode them elsewhere.
//! - **Level 2 (Dynamic)**: [`EncodingConfig`], chosen per [`Codec`](crate::Codec)
//!   or per operation, optionally loaded from YAML (`config-loaders` feature).
//!
//! # Example
//!
//! ```rust
//! use dynwire::{EncodingConfig, FormatType};
//!
//! let config = EncodingConfig::default()
//!     .with_format(FormatType::Compact)
//!     .with_class_graph_depth_max(16);
//! assert_eq!(config.format, FormatType::Compact);
//! ```

#[cfg(feature = "config-loaders")]
use crate::error::{Error, Result};

// =======================================================================
// Size encoding
// =======================================================================

/// Largest value encoded in a single size byte.
pub const SIZE_SHORT_MAX: i32 = 254;

/// Marker byte announcing a 4-byte size.
pub const SIZE_LONG_MARKER: u8 = 0xFF;

// =======================================================================
// Optional members
// =======================================================================

/// Terminates the optional members of a slice.
pub const OPTIONAL_END_MARKER: u8 = 0xFF;

/// Tags at or above this value are written after the header byte.
pub const OPTIONAL_TAG_INLINE_MAX: i32 = 30;

// =======================================================================
// Slice flags (one byte at the start of every slice)
// =======================================================================

pub const FLAG_HAS_TYPE_ID_STRING: u8 = 1 << 0;
pub const FLAG_HAS_TYPE_ID_INDEX: u8 = 1 << 1;
pub const FLAG_HAS_TYPE_ID_COMPACT: u8 = (1 << 0) | (1 << 1);
pub const FLAG_HAS_OPTIONAL_MEMBERS: u8 = 1 << 2;
pub const FLAG_HAS_INDIRECTION_TABLE: u8 = 1 << 3;
pub const FLAG_HAS_SLICE_SIZE: u8 = 1 << 4;
pub const FLAG_IS_LAST_SLICE: u8 = 1 << 5;

// =======================================================================
// Class instances
// =======================================================================

/// Instance marker meaning "a new instance follows inline".
pub const INSTANCE_INLINE_MARKER: i32 = 1;

/// Index assigned to the first instance of a call (the counter starts at 1).
pub const FIRST_INSTANCE_INDEX: i32 = 2;

/// Type id of the root of every class hierarchy.
pub const ROOT_CLASS_ID: &str = "::Ice::Object";

// =======================================================================
// Encapsulations
// =======================================================================

/// Encoding version written in every encapsulation header.
pub const ENCODING_MAJOR: u8 = 1;
pub const ENCODING_MINOR: u8 = 1;

/// Size (4 bytes) plus version (2 bytes).
pub const ENCAPSULATION_HEADER_SIZE: i32 = 6;

/// Protocol version written in proxies.
pub const PROTOCOL_MAJOR: u8 = 1;
pub const PROTOCOL_MINOR: u8 = 0;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Default maximum nesting of class instances decoded inline.
pub const DEFAULT_CLASS_GRAPH_DEPTH_MAX: usize = 100;

/// Default maximum element count accepted for a sequence or dictionary.
/// Far beyond legitimate payloads while still catching allocation bombs.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 1_000_000;

/// Class and exception encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "lowercase"))]
pub enum FormatType {
    /// Type ids only on the first slice, no slice sizes: smaller, but a
    /// decoder cannot skip unknown slices.
    Compact,
    /// Every slice carries its type id and size, and class references inside
    /// a slice go through an indirection table.
    #[default]
    Sliced,
}

/// Per-call encoding settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct EncodingConfig {
    /// Format used for class instances. Exceptions are always sliced.
    pub format: FormatType,
    /// Maximum nesting of class instances while unmarshaling.
    pub class_graph_depth_max: usize,
    /// Maximum element count for sequences and dictionaries.
    pub max_sequence_length: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            format: FormatType::default(),
            class_graph_depth_max: DEFAULT_CLASS_GRAPH_DEPTH_MAX,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }
}

impl EncodingConfig {
    pub fn with_format(mut self, format: FormatType) -> Self {
        self.format = format;
        self
    }

    pub fn with_class_graph_depth_max(mut self, depth: usize) -> Self {
        self.class_graph_depth_max = depth;
        self
    }

    pub fn with_max_sequence_length(mut self, len: usize) -> Self {
        self.max_sequence_length = len;
        self
    }

    /// Parse a configuration from YAML. Missing keys keep their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::configuration(format!("invalid encoding config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    #[cfg(feature = "config-loaders")]
    fn check(&self) -> Result<()> {
        if self.class_graph_depth_max == 0 {
            return Err(Error::configuration(
                "class_graph_depth_max must be at least 1",
            ));
        }
        Ok(())
    }
}
