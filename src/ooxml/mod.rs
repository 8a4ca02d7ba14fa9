//! Office Open XML packages.
//!
//! [`opc`] holds the package layer (parts, relationships, content types);
//! [`pptx`] builds presentations on top of it.

pub mod opc;
pub mod pptx;

pub use opc::{Archive, PartName};
