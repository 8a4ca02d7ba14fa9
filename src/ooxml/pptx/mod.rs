//! PowerPoint (.pptx) deck building from a template.
//!
//! A deck is assembled from three inputs:
//!
//! - a template package, whose slides serve as fragments,
//! - a [`TemplateStructure`] naming the slide types and their placeholder tokens,
//! - a [`ContentPlan`] listing the slides to produce with their values.
//!
//! Template slides are cloned with fresh identifiers ([`cloner`]), their
//! tokens replaced ([`resolver`]), and the package manifests regenerated
//! from the final slide list ([`manifest`]). [`builder`] runs these stages in
//! order.
//!
//! # Example
//!
//! ```no_run
//! use longan::ooxml::pptx::{BuildOptions, ContentPlan, SlideInstance, TemplateCache, build_from_archive};
//! use longan::ooxml::pptx::TemplateStructure;
//!
//! # fn main() -> longan::Result<()> {
//! let cache = TemplateCache::new();
//! let template = cache.get_or_open(&std::fs::read("template.pptx")?)?;
//! let structure = TemplateStructure::from_json(&std::fs::read_to_string("structure.json")?)?;
//!
//! let plan = ContentPlan::new(vec![
//!     SlideInstance::new("TITLE").with("{{TITLE_TITLE}}", "Quarterly review"),
//!     SlideInstance::new("CLOSE"),
//! ]);
//! let result = build_from_archive(&template, &structure, &plan, None, &BuildOptions::default())?;
//! println!("{} slides", result.slides.len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod cloner;
pub mod ids;
pub mod manifest;
pub mod options;
pub mod package;
pub mod plan;
pub mod resolver;
pub mod roster;
pub mod structure;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{BuildResult, BuildStage, PresentationBuilder, build, build_from_archive};
pub use cache::TemplateCache;
pub use cloner::{ClonedSlide, SlideCloner, SlideHandle};
pub use ids::IdAllocator;
pub use manifest::{ManifestViews, SlideList, inspect};
pub use options::BuildOptions;
pub use plan::{ContentPlan, ItemType, ListItem, ReplacementValue, Replacements, Roster, RosterMember, SlideInstance};
pub use resolver::{ListStyle, ResolveReport, Resolver, TokenMap, find_tokens, resolve_fragment};
pub use structure::{Placeholder, PlaceholderKind, SlideRole, SlideTypeDescriptor, TemplateStructure};
