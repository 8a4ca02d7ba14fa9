//! Build configuration.
//!
//! Every field has a default, so an empty document (`{}`) is a valid
//! configuration. Options are read from JSON, or from YAML with the `yaml`
//! feature.

use crate::common::{Error, Result};
use crate::ooxml::opc::Compression;
use serde::{Deserialize, Serialize};

/// Hanging indent applied to bullet and numbered items, in EMU (0.375 inch).
pub const DEFAULT_LIST_INDENT_EMU: i64 = 342_900;

/// Options controlling one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Slide type treated as the closing slide when the structure declares no role
    pub closing_slide_type: String,
    /// Slide type used for the roster when the structure declares no roster role
    pub roster_slide_type: String,
    /// Title written on the roster slide
    pub roster_title: String,
    /// Glyph of `bullet` items
    pub bullet_char: String,
    /// `a:buAutoNum` scheme of `numbered` items
    pub numbering_scheme: String,
    /// Hanging indent of bullet and numbered items
    pub list_indent_emu: i64,
    pub compression: Compression,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            closing_slide_type: "CLOSE".to_string(),
            roster_slide_type: "TEAM".to_string(),
            roster_title: "Team".to_string(),
            bullet_char: "\u{2022}".to_string(),
            numbering_scheme: "arabicPeriod".to_string(),
            list_indent_emu: DEFAULT_LIST_INDENT_EMU,
            compression: Compression::Deflated,
        }
    }
}

impl BuildOptions {
    /// Read options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("build options: {e}")))
    }

    /// Read options from YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::InvalidInput(format!("build options: {e}")))
    }

    /// Write options as YAML.
    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::InvalidInput(format!("build options: {e}")))
    }

    /// Read options, choosing the format from a file name extension.
    pub fn from_str_with_ext(text: &str, ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Self::from_json(text),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Self::from_yaml(text),
            other => Err(Error::InvalidInput(format!(
                "unsupported options format '{other}'"
            ))),
        }
    }
}
