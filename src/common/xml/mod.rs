//! XML support shared by every package part.
//!
//! Parts are parsed into a lossless [`XmlDocument`] tree, edited in place and
//! serialized back with the escaping helpers in [`escape`].

pub mod escape;
pub mod tree;

pub use escape::{escape_attr, escape_text};
pub use tree::{Element, Node, XML_DECLARATION, XmlDocument, XmlError};
