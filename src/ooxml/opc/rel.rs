/// Relationship parts of an OPC package.
///
/// A `.rels` part lists the relationships from one source part to its
/// targets. [`Relationships`] is an ordered, editable view over one such part;
/// it keeps the original order so unchanged relationships are written back
/// where they were.
use crate::common::xml::{Element, XmlDocument};
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::packuri::PartName;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Create an internal relationship.
    pub fn new(r_id: impl Into<String>, reltype: impl Into<String>, target_ref: impl Into<String>) -> Self {
        Self {
            r_id: r_id.into(),
            reltype: reltype.into(),
            target_ref: target_ref.into(),
            is_external: false,
        }
    }

    /// Create an external relationship (hyperlinks, linked media).
    pub fn external(r_id: impl Into<String>, reltype: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            is_external: true,
            ..Self::new(r_id, reltype, url)
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference as written in the part.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Numeric part of an `rIdN` identifier.
    #[inline]
    pub fn r_id_number(&self) -> Option<u32> {
        parse_r_id(&self.r_id)
    }

    /// Absolute target part for internal relationships, resolved against `base_dir`.
    pub fn target_part(&self, base_dir: &str) -> Option<PartName> {
        if self.is_external {
            return None;
        }
        Some(PartName::resolve(base_dir, &self.target_ref))
    }
}

/// Parse the number out of an `rIdN` identifier.
pub fn parse_r_id(r_id: &str) -> Option<u32> {
    r_id.strip_prefix("rId")?.parse().ok()
}

/// Ordered collection of relationships from a single source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    /// Directory of the source part, for resolving relative targets
    base_dir: String,

    rels: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            rels: Vec::new(),
        }
    }

    /// Read the relationships of a parsed `.rels` part.
    ///
    /// Elements other than `Relationship`, and entries lacking an `Id` or
    /// `Target`, are skipped.
    pub fn from_document(doc: &XmlDocument, base_dir: impl Into<String>) -> Self {
        let rels = doc
            .root()
            .elements()
            .filter(|el| el.local_name() == "Relationship")
            .filter_map(|el| {
                let r_id = el.attr("Id")?;
                let target = el.attr("Target")?;
                let reltype = el.attr("Type").unwrap_or_default();
                let rel = if el.attr("TargetMode") == Some(target_mode::EXTERNAL) {
                    Relationship::external(r_id, reltype, target)
                } else {
                    Relationship::new(r_id, reltype, target)
                };
                Some(rel)
            })
            .collect();

        Self {
            base_dir: base_dir.into(),
            rels,
        }
    }

    /// Directory the relative targets resolve against.
    #[inline]
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Append a relationship.
    #[inline]
    pub fn push(&mut self, rel: Relationship) {
        self.rels.push(rel);
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id() == r_id)
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.reltype() == reltype)
    }

    /// All relationships of the given type, in document order.
    pub fn of_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.rels.iter().filter(move |rel| rel.reltype() == reltype)
    }

    /// Keep only the relationships matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&Relationship) -> bool) {
        self.rels.retain(keep);
    }

    /// Get an iterator over all relationships.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Highest `rIdN` number in use, 0 when there is none.
    pub fn max_r_id(&self) -> u32 {
        self.rels
            .iter()
            .filter_map(Relationship::r_id_number)
            .max()
            .unwrap_or(0)
    }

    /// Next relationship ID above every one in use.
    ///
    /// Gaps are never reused, so an ID freed by a removed relationship
    /// cannot be handed to a different target.
    pub fn next_r_id(&self) -> String {
        format!("rId{}", self.max_r_id() + 1)
    }

    /// Resolved internal target parts, in document order.
    pub fn target_parts(&self) -> Vec<PartName> {
        self.rels
            .iter()
            .filter_map(|rel| rel.target_part(&self.base_dir))
            .collect()
    }

    /// Build the `.rels` part.
    pub fn to_document(&self) -> XmlDocument {
        let mut root = Element::with_namespace("Relationships", namespace::OPC_RELATIONSHIPS);
        root.set_attr("xmlns", namespace::OPC_RELATIONSHIPS);

        for rel in &self.rels {
            let mut el = Element::with_namespace("Relationship", namespace::OPC_RELATIONSHIPS);
            el.set_attr("Id", rel.r_id());
            el.set_attr("Type", rel.reltype());
            el.set_attr("Target", rel.target_ref());
            if rel.is_external() {
                el.set_attr("TargetMode", target_mode::EXTERNAL);
            }
            root.push_element(el);
        }

        XmlDocument::new(root)
    }
}
