//! Longan - template-driven PowerPoint deck assembly
//!
//! This library builds `.pptx` presentations by cloning slides of a template
//! package and replacing placeholder tokens in them. It works directly on the
//! package's ZIP container and XML parts: no rendering, no object model of
//! the presentation beyond what assembly needs.
//!
//! # Features
//!
//! - **Lossless XML editing**: parts are parsed into a tree that serializes
//!   back without losing markup the builder does not understand
//! - **Split-token matching**: tokens broken over several runs are still found
//! - **List expansion**: one paragraph per item, with bullet or numbering markers
//! - **Consistent manifests**: slide list, relationships and content types are
//!   regenerated together and verified
//! - **Template cache**: one opened template shared by concurrent builds
//! - **Plan generation barrier** (feature `generation`): bounded concurrent
//!   slide writing collected into one complete plan
//!
//! # Example - Building a deck
//!
//! ```no_run
//! use longan::ooxml::pptx::{BuildOptions, ContentPlan, ListItem, SlideInstance, TemplateStructure, build};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = std::fs::read("template.pptx")?;
//! let structure = TemplateStructure::from_json(&std::fs::read_to_string("structure.json")?)?;
//!
//! let plan = ContentPlan::new(vec![
//!     SlideInstance::new("TITLE").with("{{TITLE_TITLE}}", "Quarterly review"),
//!     SlideInstance::new("BULLETS_4")
//!         .with("{{TITLE_BULLETS_4}}", "Agenda")
//!         .with("{{ITEMS}}", vec![ListItem::bullet("Results"), ListItem::bullet("Outlook")]),
//!     SlideInstance::new("CLOSE"),
//! ]);
//!
//! let result = build(&template, &structure, &plan, None, &BuildOptions::default())?;
//! std::fs::write("deck.pptx", &result.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting a package
//!
//! ```no_run
//! use longan::ooxml::opc::Archive;
//! use longan::ooxml::pptx::inspect;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Archive::open(&std::fs::read("deck.pptx")?)?;
//! let views = inspect(&archive)?;
//! for slide in &views.presentation {
//!     println!("{slide}");
//! }
//! # Ok(())
//! # }
//! ```

/// Error type and XML tree shared by every module
pub mod common;

/// OOXML packages and presentation building
pub mod ooxml;

/// Bounded concurrent plan generation
#[cfg(feature = "generation")]
pub mod generation;

pub use common::{Error, Result};
pub use ooxml::opc::{Archive, Compression};
pub use ooxml::pptx::{
    BuildOptions, BuildResult, ContentPlan, PresentationBuilder, Roster, TemplateCache, TemplateStructure, build,
    build_from_archive,
};
