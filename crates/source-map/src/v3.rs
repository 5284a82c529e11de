//! The version-3 source map structure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for source map handling.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The compiler handed back something that is not a V3 source map.
    #[error("invalid source map JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The map declares a version other than 3.
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u32),
}

/// A version-3 source map.
///
/// `mappings` is the encoded per-line table: one group of VLQ-encoded
/// segments per generated line, groups delimited by `;`. The pipeline never
/// decodes the segments; it only needs the group-per-line structure, which
/// is why edits to the JavaScript must either stay within a line or be
/// paired with [`SourceMapV3::prepend_unmapped_line`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapV3 {
    pub version: u32,

    /// Name of the generated file this map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original source file names.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Embedded original source text, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,

    #[serde(default)]
    pub names: Vec<String>,

    pub mappings: String,
}

impl SourceMapV3 {
    /// Parses a V3 source map from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        let map: Self = serde_json::from_str(json)?;
        if map.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(map.version));
        }
        Ok(map)
    }

    /// Serializes the map back to JSON text.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Records one generated line, with no original-source mapping, inserted
    /// at the very top of the generated file.
    ///
    /// Every existing group keeps its contents and shifts down one line,
    /// which is exactly what prefixing the table with an empty group does.
    pub fn prepend_unmapped_line(&mut self) {
        self.mappings.insert(0, ';');
    }

    /// Number of per-line mapping groups in the encoded table.
    ///
    /// For a map that matches its JavaScript, this equals the generated
    /// file's line count.
    pub fn group_count(&self) -> usize {
        self.mappings.split(';').count()
    }
}
