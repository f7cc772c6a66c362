//! Codec configuration
//!
//! Limits and sizing knobs, loadable from TOML. Reading the file is left to
//! the host; this module only parses and validates the text.

use crate::error::{CodecError, Result};
use crate::primitive::ReadLimits;
use crate::virtual_buffer::CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Codec configuration.
///
/// # Example
///
/// ```toml
/// chunk_size = 80896
/// max_collection_len = 16777216
/// max_buffer_len = 1073741824
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Chunk size used when decoding virtual buffers
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Largest decoded element/entry/member count
    #[serde(default = "default_max_collection_len")]
    pub max_collection_len: usize,
    /// Largest decoded string, buffer or virtual buffer length
    #[serde(default = "default_max_buffer_len")]
    pub max_buffer_len: usize,
}

fn default_chunk_size() -> usize {
    CHUNK_SIZE
}

fn default_max_collection_len() -> usize {
    16_777_216
}

fn default_max_buffer_len() -> usize {
    1_073_741_824
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_collection_len: default_max_collection_len(),
            max_buffer_len: default_max_buffer_len(),
        }
    }
}

impl CodecConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// `InvalidData` if the text does not parse or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig = toml::from_str(text)
            .map_err(|e| CodecError::invalid(format!("failed to parse codec config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CodecError::invalid(format!("failed to serialize codec config: {}", e)))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Codec configuration
#
# Chunk size in bytes for virtual buffers rebuilt on decode (default: 80896)
chunk_size = 80896

# Largest element/entry/member count accepted on decode (default: 16777216)
max_collection_len = 16777216

# Largest string/buffer length in bytes accepted on decode (default: 1 GiB)
max_buffer_len = 1073741824
"#
    }

    /// Reject zero sizes and limits
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CodecError::invalid("chunk_size must be positive"));
        }
        if self.max_collection_len == 0 {
            return Err(CodecError::invalid("max_collection_len must be positive"));
        }
        if self.max_buffer_len == 0 {
            return Err(CodecError::invalid("max_buffer_len must be positive"));
        }
        Ok(())
    }

    /// Length limits for a primitive reader
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            max_collection_len: self.max_collection_len,
            max_buffer_len: self.max_buffer_len,
        }
    }
}
