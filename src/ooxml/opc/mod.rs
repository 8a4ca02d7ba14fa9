/// Open Packaging Conventions (OPC) support for presentation packages.
///
/// This module covers the package-level vocabulary a slide rebuild needs:
///
/// - Part names and relationship-part naming
/// - Relationship parts (`.rels`)
/// - The content-type registry (`[Content_Types].xml`)
/// - The in-memory ZIP archive with lazily parsed parts

pub mod archive;
pub mod constants;
pub mod content_types;
pub mod packuri;
pub mod rel;

// Re-export commonly used types
pub use archive::{Archive, Compression, Entry};
pub use content_types::ContentTypes;
pub use packuri::{CONTENT_TYPES_MEMBER, PACKAGE_RELS_MEMBER, PartName};
pub use rel::{Relationship, Relationships};
