//! Content plan: the ordered slides to build and the text for each token.

use crate::common::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker rendered in front of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Bullet,
    Numbered,
    #[serde(alias = "plain")]
    Text,
}

/// One entry of a list value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, alias = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub value: String,
}

impl ListItem {
    pub fn new(item_type: ItemType, value: impl Into<String>) -> Self {
        Self {
            item_type,
            value: value.into(),
        }
    }

    pub fn bullet(value: impl Into<String>) -> Self {
        Self::new(ItemType::Bullet, value)
    }

    pub fn numbered(value: impl Into<String>) -> Self {
        Self::new(ItemType::Numbered, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ItemType::Text, value)
    }
}

/// Value bound to a placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplacementValue {
    Text(String),
    List(Vec<ListItem>),
}

impl ReplacementValue {
    /// Coerce to a list: text becomes a single bullet, empty text no items.
    pub fn into_list(self) -> Vec<ListItem> {
        match self {
            ReplacementValue::List(items) => items,
            ReplacementValue::Text(text) if text.is_empty() => Vec::new(),
            ReplacementValue::Text(text) => vec![ListItem::bullet(text)],
        }
    }

    /// Flatten to text: list items joined by line breaks.
    pub fn into_text(self) -> String {
        match self {
            ReplacementValue::Text(text) => text,
            ReplacementValue::List(items) => items
                .into_iter()
                .map(|item| item.value)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for ReplacementValue {
    fn from(text: &str) -> Self {
        ReplacementValue::Text(text.to_string())
    }
}

impl From<String> for ReplacementValue {
    fn from(text: String) -> Self {
        ReplacementValue::Text(text)
    }
}

impl From<Vec<ListItem>> for ReplacementValue {
    fn from(items: Vec<ListItem>) -> Self {
        ReplacementValue::List(items)
    }
}

/// Token → value map of one slide, in token order.
pub type Replacements = IndexMap<String, ReplacementValue>;

/// One slide to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideInstance {
    pub slide_type: String,
    #[serde(default)]
    pub replacements: Replacements,
}

impl SlideInstance {
    pub fn new(slide_type: impl Into<String>) -> Self {
        Self {
            slide_type: slide_type.into(),
            replacements: Replacements::new(),
        }
    }

    /// Bind a token.
    pub fn with(mut self, token: impl Into<String>, value: impl Into<ReplacementValue>) -> Self {
        self.replacements.insert(token.into(), value.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlan {
    Wrapped { slides: Vec<SlideInstance> },
    Bare(Vec<SlideInstance>),
}

/// Ordered slide instances of one deck.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ContentPlan {
    pub slides: Vec<SlideInstance>,
}

impl<'de> Deserialize<'de> for ContentPlan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let slides = match RawPlan::deserialize(deserializer)? {
            RawPlan::Wrapped { slides } | RawPlan::Bare(slides) => slides,
        };
        Ok(Self { slides })
    }
}

impl ContentPlan {
    pub fn new(slides: Vec<SlideInstance>) -> Self {
        Self { slides }
    }

    /// Read a plan document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("content plan: {e}")))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// One member of the team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl RosterMember {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Ordered team members shown on the roster slide.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    pub members: Vec<RosterMember>,
}

impl Roster {
    pub fn new(members: Vec<RosterMember>) -> Self {
        Self { members }
    }

    /// Read a roster document (`[{"name", "role"}]`).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("roster: {e}")))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
