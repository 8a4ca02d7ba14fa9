//! Lossless XML element tree for package parts.
//!
//! Slide fragments come from arbitrary templates, so the tree keeps everything
//! needed to write a part back without disturbing it: attribute order, the
//! exact qualified names and `xmlns` declarations, comments, processing
//! instructions and CDATA sections. Each element also records the namespace
//! URI its prefix resolved to at parse time, so lookups can be made by
//! namespace and local name regardless of the prefixes a template uses.

use super::escape::{escape_attr, escape_text};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Errors raised while parsing a part into an [`XmlDocument`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The reader rejected the input
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// An attribute could not be read or unescaped
    #[error("invalid attribute: {0}")]
    Attribute(String),

    /// Non UTF-8 bytes where text was expected
    #[error("invalid UTF-8 in {0}")]
    Utf8(&'static str),

    /// End of input reached with open elements
    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// No root element, or more than one
    #[error("document must have exactly one root element")]
    NoRoot,
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, stored unescaped
    Text(String),
    /// CDATA section content, stored verbatim
    CData(String),
    /// Comment content, stored verbatim
    Comment(String),
    /// Processing instruction content (target and data), stored verbatim
    Instruction(String),
}

impl Node {
    /// Returns the element if this node is one.
    #[inline]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the element mutably if this node is one.
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and mixed content.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written in the source (e.g. `a:p`)
    name: String,
    /// Namespace URI the prefix resolved to, if any
    namespace: Option<String>,
    /// Attributes in document order, values unescaped; includes `xmlns` declarations
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element without namespace information.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element in the same namespace, and with the same prefix, as `sibling`.
    ///
    /// Used when a new element has to be added next to existing template
    /// markup, e.g. `a:buChar` inside a cloned `a:pPr`.
    pub fn new_like(sibling: &Element, local_name: &str) -> Self {
        let name = match sibling.prefix() {
            Some(prefix) => format!("{prefix}:{local_name}"),
            None => local_name.to_string(),
        };
        Self {
            name,
            namespace: sibling.namespace.clone(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element with an explicit namespace URI.
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Copy of this element's name, namespace and attributes, without children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local part of the qualified name.
    #[inline]
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Prefix of the qualified name, if any.
    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace-aware name test.
    #[inline]
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name() == local_name && self.namespace() == Some(namespace)
    }

    #[inline]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Get an attribute by its qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Find the prefix this element itself declares for `namespace`.
    ///
    /// Returns `Some("")` for a default namespace declaration.
    pub fn declared_prefix(&self, namespace: &str) -> Option<&str> {
        self.attributes.iter().find_map(|(key, value)| {
            if value != namespace {
                return None;
            }
            if key == "xmlns" {
                Some("")
            } else {
                key.strip_prefix("xmlns:")
            }
        })
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// First child element with the given namespace and local name.
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(namespace, local_name))
    }

    /// First child element with the given namespace and local name, mutably.
    pub fn child_mut(&mut self, namespace: &str, local_name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.is(namespace, local_name))
    }

    /// Append a child element.
    #[inline]
    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Concatenated text of the direct text and CDATA children.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) | Node::CData(t) => text.push_str(t),
                _ => {},
            }
        }
        text
    }

    /// Replace the direct text content, keeping child elements in place.
    ///
    /// The new text node takes the position of the first text node removed;
    /// if there was none it is appended.
    pub fn set_text(&mut self, text: &str) {
        let first = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Text(_) | Node::CData(_)));
        self.children
            .retain(|node| !matches!(node, Node::Text(_) | Node::CData(_)));
        if text.is_empty() {
            return;
        }
        let at = first.unwrap_or(self.children.len()).min(self.children.len());
        self.children.insert(at, Node::Text(text.to_string()));
    }

    /// Visit this element and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    /// Visit this element and all descendants mutably, parents before children.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        visit(self);
        for child in self.elements_mut() {
            child.walk_mut(visit);
        }
    }

    /// All descendants (including self) with the given namespace and local name.
    pub fn descendants(&self, namespace: &str, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.walk(&mut |el| {
            if el.is(namespace, local_name) {
                found.push(el);
            }
        });
        found
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => el.write_into(out),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        },
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        },
        Node::Instruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        },
    }
}

/// XML declaration written at the top of every serialized part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A parsed package part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Comments and processing instructions before the root element
    prolog: Vec<Node>,
    root: Element,
}

impl XmlDocument {
    /// Wrap a root element into a document.
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse a document from bytes.
    ///
    /// Whitespace is preserved exactly; entity and character references are
    /// resolved into the stored text.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut prolog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XmlError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;

            match event {
                Event::Start(ref e) => {
                    let element = open_element(e, &mut scopes)?;
                    stack.push(element);
                },
                Event::Empty(ref e) => {
                    let element = open_element(e, &mut scopes)?;
                    scopes.pop();
                    attach(element, &mut stack, &mut root)?;
                },
                Event::End(_) => {
                    scopes.pop();
                    let element = stack.pop().ok_or(XmlError::NoRoot)?;
                    attach(element, &mut stack, &mut root)?;
                },
                Event::Text(ref t) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = std::str::from_utf8(t).map_err(|_| XmlError::Utf8("text"))?;
                        let text = quick_xml::escape::unescape(raw).map_err(|e| {
                            XmlError::Malformed {
                                position: reader.buffer_position() as u64,
                                message: e.to_string(),
                            }
                        })?;
                        push_text(current, &text);
                    }
                },
                Event::GeneralRef(ref r) => {
                    if let Some(current) = stack.last_mut() {
                        let name = std::str::from_utf8(r).map_err(|_| XmlError::Utf8("entity"))?;
                        let reference = format!("&{name};");
                        let text = quick_xml::escape::unescape(&reference).map_err(|e| {
                            XmlError::Malformed {
                                position: reader.buffer_position() as u64,
                                message: e.to_string(),
                            }
                        })?;
                        push_text(current, &text);
                    }
                },
                Event::CData(ref c) => {
                    if let Some(current) = stack.last_mut() {
                        let data = std::str::from_utf8(c).map_err(|_| XmlError::Utf8("CDATA"))?;
                        current.children.push(Node::CData(data.to_string()));
                    }
                },
                Event::Comment(ref c) => {
                    let comment = std::str::from_utf8(c).map_err(|_| XmlError::Utf8("comment"))?;
                    let node = Node::Comment(comment.to_string());
                    match stack.last_mut() {
                        Some(current) => current.children.push(node),
                        None if root.is_none() => prolog.push(node),
                        None => {},
                    }
                },
                Event::PI(ref pi) => {
                    let data = std::str::from_utf8(pi)
                        .map_err(|_| XmlError::Utf8("processing instruction"))?;
                    let node = Node::Instruction(data.to_string());
                    match stack.last_mut() {
                        Some(current) => current.children.push(node),
                        None if root.is_none() => prolog.push(node),
                        None => {},
                    }
                },
                Event::Eof => break,
                // The declaration is rewritten on output; DTDs are not used by OOXML.
                _ => {},
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Unclosed(open.name.clone()));
        }

        let root = root.ok_or(XmlError::NoRoot)?;
        Ok(Self { prolog, root })
    }

    #[inline]
    pub fn root(&self) -> &Element {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    #[inline]
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Prefix the root element declares for `namespace`, if any.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.root.declared_prefix(namespace)
    }

    /// Serialize with a standalone UTF-8 declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write_into(&mut out);
        out
    }

    /// Serialize to bytes.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }
}

fn open_element(
    start: &BytesStart<'_>,
    scopes: &mut Vec<Vec<(String, String)>>,
) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|_| XmlError::Utf8("element name"))?
        .to_string();

    let mut attributes = Vec::new();
    let mut declared = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Attribute(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| XmlError::Utf8("attribute name"))?
            .to_string();
        let raw = std::str::from_utf8(&attr.value).map_err(|_| XmlError::Utf8("attribute value"))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|e| XmlError::Attribute(format!("{key}: {e}")))?
            .into_owned();

        if key == "xmlns" {
            declared.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value.clone()));
        }
        attributes.push((key, value));
    }
    scopes.push(declared);

    let prefix = name.split_once(':').map(|(p, _)| p).unwrap_or("");
    let namespace = scopes.iter().rev().find_map(|scope| {
        scope
            .iter()
            .find(|(declared_prefix, _)| declared_prefix == prefix)
            .map(|(_, uri)| uri.clone())
    });

    Ok(Element {
        name,
        namespace: namespace.filter(|uri| !uri.is_empty()),
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::NoRoot),
    }
    Ok(())
}

// Entity references arrive as separate events; keep them in one text node.
fn push_text(element: &mut Element, text: &str) {
    if let Some(Node::Text(last)) = element.children.last_mut() {
        last.push_str(text);
    } else {
        element.children.push(Node::Text(text.to_string()));
    }
}
