//! Template structure: which slide fragments exist and what they hold.
//!
//! A [`TemplateStructure`] is produced outside this crate (by hand or by an
//! analysis step) and names every slide type a plan may use. Two document
//! shapes are read:
//!
//! ```json
//! {"slides": [{"type": "BULLETS_4", "source_path": "ppt/slides/slide2.xml",
//!              "placeholders": [{"token": "{{ITEMS}}", "kind": "list"}]}]}
//! ```
//!
//! and the older analyzer output, where `replacements` lists the tokens (as a
//! map or an array) and `list_fields` marks the list-valued ones.

use crate::common::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a placeholder's value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    /// Replaced in place inside its run
    #[default]
    Scalar,
    /// Its paragraph is expanded into one paragraph per item
    List,
}

/// One placeholder token declared by a slide type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub token: String,
    #[serde(default)]
    pub kind: PlaceholderKind,
}

/// Role a slide type plays in a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideRole {
    Title,
    Content,
    Closing,
    Roster,
}

/// One slide type of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDescriptor")]
pub struct SlideTypeDescriptor {
    #[serde(rename = "type")]
    pub name: String,
    /// Archive path of the source fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// 0-based position in the template's slide order, used when `source_path` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SlideRole>,
}

impl SlideTypeDescriptor {
    /// Descriptor for a template slide at `slide_index`.
    pub fn at_index(name: impl Into<String>, slide_index: usize) -> Self {
        Self {
            name: name.into(),
            source_path: None,
            slide_index: Some(slide_index),
            placeholders: Vec::new(),
            description: None,
            role: None,
        }
    }

    /// Descriptor for a template slide at an archive path.
    pub fn at_path(name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            slide_index: None,
            ..Self::at_index(name, 0)
        }
    }

    /// Add a placeholder declaration.
    pub fn with_placeholder(mut self, token: impl Into<String>, kind: PlaceholderKind) -> Self {
        self.placeholders.push(Placeholder {
            token: token.into(),
            kind,
        });
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: SlideRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Declared kind of a token; undeclared tokens are scalars.
    pub fn kind_of(&self, token: &str) -> PlaceholderKind {
        self.placeholders
            .iter()
            .find(|p| p.token == token)
            .map(|p| p.kind)
            .unwrap_or_default()
    }
}

/// Legacy analyzer output lists tokens either as a map or as an array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTokens {
    Map(IndexMap<String, serde_json::Value>),
    List(Vec<String>),
}

#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(rename = "type", alias = "slide_type")]
    name: String,
    #[serde(default)]
    source_path: Option<String>,
    #[serde(default)]
    slide_index: Option<usize>,
    #[serde(default)]
    placeholders: Vec<Placeholder>,
    #[serde(default)]
    replacements: Option<RawTokens>,
    #[serde(default)]
    list_fields: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    role: Option<SlideRole>,
}

impl From<RawDescriptor> for SlideTypeDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        let mut placeholders = raw.placeholders;

        let legacy: Vec<String> = match raw.replacements {
            Some(RawTokens::Map(map)) => map.into_keys().collect(),
            Some(RawTokens::List(list)) => list,
            None => Vec::new(),
        };
        for token in legacy.into_iter().chain(raw.list_fields.iter().cloned()) {
            if placeholders.iter().any(|p| p.token == token) {
                continue;
            }
            placeholders.push(Placeholder {
                token,
                kind: PlaceholderKind::Scalar,
            });
        }
        for placeholder in placeholders.iter_mut() {
            if raw.list_fields.contains(&placeholder.token) {
                placeholder.kind = PlaceholderKind::List;
            }
        }

        Self {
            name: raw.name,
            source_path: raw.source_path,
            slide_index: raw.slide_index,
            placeholders,
            description: raw.description.filter(|d| !d.is_empty()),
            role: raw.role,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStructure {
    Wrapped { slides: Vec<SlideTypeDescriptor> },
    Bare(Vec<SlideTypeDescriptor>),
}

/// All slide types of a template, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TemplateStructure {
    pub slides: Vec<SlideTypeDescriptor>,
}

impl<'de> Deserialize<'de> for TemplateStructure {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let slides = match RawStructure::deserialize(deserializer)? {
            RawStructure::Wrapped { slides } | RawStructure::Bare(slides) => slides,
        };
        Ok(Self { slides })
    }
}

impl TemplateStructure {
    pub fn new(slides: Vec<SlideTypeDescriptor>) -> Self {
        Self { slides }
    }

    /// Read a structure document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("template structure: {e}")))
    }

    /// Look up a slide type by name. The first declaration wins.
    pub fn get(&self, name: &str) -> Option<&SlideTypeDescriptor> {
        self.slides.iter().find(|s| s.name == name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a slide type, failing with [`Error::UnknownSlideType`].
    pub fn require(&self, name: &str) -> Result<&SlideTypeDescriptor> {
        self.get(name)
            .ok_or_else(|| Error::UnknownSlideType(name.to_string()))
    }

    /// First slide type declaring `role`.
    pub fn with_role(&self, role: SlideRole) -> Option<&SlideTypeDescriptor> {
        self.slides.iter().find(|s| s.role == Some(role))
    }

    /// Whether `name` is a closing slide: declared with the closing role, or
    /// named like the configured closing type.
    pub fn is_closing(&self, name: &str, closing_type: &str) -> bool {
        match self.get(name).and_then(|s| s.role) {
            Some(role) => role == SlideRole::Closing,
            None => name == closing_type,
        }
    }
}
