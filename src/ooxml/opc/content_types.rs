/// The `[Content_Types].xml` registry.
///
/// Maps each part to its content type, either by file extension (`Default`)
/// or by exact part name (`Override`). Entry order is kept as read.
use crate::common::xml::{Element, XmlDocument};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::packuri::PartName;

/// Editable view of the content-type registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentTypes {
    /// Default content types by lowercase extension
    defaults: Vec<(String, String)>,

    /// Override content types by part name
    overrides: Vec<(PartName, String)>,
}

impl ContentTypes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the registry from a parsed `[Content_Types].xml`.
    pub fn from_document(doc: &XmlDocument) -> Self {
        let mut types = Self::new();
        for el in doc.root().elements() {
            let Some(content_type) = el.attr("ContentType") else {
                continue;
            };
            match el.local_name() {
                "Default" => {
                    if let Some(ext) = el.attr("Extension") {
                        types.defaults.push((ext.to_ascii_lowercase(), content_type.to_string()));
                    }
                },
                "Override" => {
                    if let Some(part) = el.attr("PartName") {
                        types.overrides.push((PartName::new(part), content_type.to_string()));
                    }
                },
                _ => {},
            }
        }
        types
    }

    /// Default entries in registry order.
    #[inline]
    pub fn defaults(&self) -> &[(String, String)] {
        &self.defaults
    }

    /// Override entries in registry order.
    #[inline]
    pub fn overrides(&self) -> &[(PartName, String)] {
        &self.overrides
    }

    /// Add or replace a default mapping.
    pub fn set_default(&mut self, ext: &str, content_type: &str) {
        let ext = ext.to_ascii_lowercase();
        match self.defaults.iter_mut().find(|(e, _)| *e == ext) {
            Some((_, ct)) => *ct = content_type.to_string(),
            None => self.defaults.push((ext, content_type.to_string())),
        }
    }

    /// Add or replace an override.
    pub fn set_override(&mut self, part: &PartName, content_type: &str) {
        match self.overrides.iter_mut().find(|(p, _)| p == part) {
            Some((_, ct)) => *ct = content_type.to_string(),
            None => self.overrides.push((part.clone(), content_type.to_string())),
        }
    }

    /// Keep only the overrides matching `keep`.
    pub fn retain_overrides(&mut self, keep: impl FnMut(&(PartName, String)) -> bool) {
        self.overrides.retain(keep);
    }

    /// Override content type for an exact part, if registered.
    pub fn override_for(&self, part: &PartName) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(p, _)| p == part)
            .map(|(_, ct)| ct.as_str())
    }

    /// Effective content type of a part: its override, else the default for its extension.
    pub fn content_type_of(&self, part: &PartName) -> Option<&str> {
        self.override_for(part).or_else(|| {
            let ext = part.ext().to_ascii_lowercase();
            self.defaults
                .iter()
                .find(|(e, _)| *e == ext)
                .map(|(_, ct)| ct.as_str())
        })
    }

    /// Parts registered by override with the given content type.
    pub fn parts_with_type(&self, content_type: &str) -> Vec<PartName> {
        self.overrides
            .iter()
            .filter(|(_, ct)| ct == content_type)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Build the `[Content_Types].xml` part, defaults first.
    pub fn to_document(&self) -> XmlDocument {
        let mut root = Element::with_namespace("Types", namespace::OPC_CONTENT_TYPES);
        root.set_attr("xmlns", namespace::OPC_CONTENT_TYPES);

        for (ext, content_type) in &self.defaults {
            let mut el = Element::with_namespace("Default", namespace::OPC_CONTENT_TYPES);
            el.set_attr("Extension", ext.as_str());
            el.set_attr("ContentType", content_type.as_str());
            root.push_element(el);
        }
        for (part, content_type) in &self.overrides {
            let mut el = Element::with_namespace("Override", namespace::OPC_CONTENT_TYPES);
            el.set_attr("PartName", part.uri());
            el.set_attr("ContentType", content_type.as_str());
            root.push_element(el);
        }

        XmlDocument::new(root)
    }
}
