//! Slide cloning.
//!
//! A clone is a deep copy of a template slide placed at a new ordinal. Its
//! shape IDs and creation ID are replaced with values from the build's
//! [`IdAllocator`], and every reference to a shape ID inside the slide
//! (animation targets, connector ends) follows the new numbering.

use crate::common::xml::{Element, XmlDocument};
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::{namespace, relationship_type as rt};
use crate::ooxml::opc::{Archive, PartName, Relationship, Relationships};
use crate::ooxml::pptx::ids::IdAllocator;
use crate::ooxml::pptx::package::slide_order;
use crate::ooxml::pptx::structure::TemplateStructure;
use std::collections::HashMap;

/// Per-slide relationships that must not be shared between slides.
pub(crate) const UNSHARED_RELATIONSHIPS: [&str; 3] = [rt::NOTES_SLIDE, rt::COMMENTS, rt::MODERN_COMMENTS];

/// Where a cloned slide lives in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideHandle {
    pub slide_type: String,
    /// 1-based position in the output
    pub ordinal: usize,
    pub part: PartName,
    pub rels_member: String,
}

impl SlideHandle {
    /// Handle for the slide at `ordinal` inside `slides_dir`.
    pub fn at(slide_type: impl Into<String>, ordinal: usize, slides_dir: &str) -> Self {
        let part = PartName::new(format!("{slides_dir}/slide{ordinal}.xml"));
        Self {
            slide_type: slide_type.into(),
            ordinal,
            rels_member: part.rels_member(),
            part,
        }
    }
}

/// A cloned slide, not yet stored in an archive.
#[derive(Debug, Clone)]
pub struct ClonedSlide {
    pub handle: SlideHandle,
    /// Template part it was copied from
    pub source: PartName,
    pub document: XmlDocument,
    pub relationships: Relationships,
}

/// Clones template slides for one build.
pub struct SlideCloner<'t> {
    template: &'t Archive,
    structure: &'t TemplateStructure,
    template_slides: Vec<PartName>,
    slides_dir: String,
    ids: IdAllocator,
}

impl<'t> SlideCloner<'t> {
    /// Prepare a cloner, seeding identifiers above those of every template slide.
    pub fn new(template: &'t Archive, structure: &'t TemplateStructure) -> Result<Self> {
        let template_slides = slide_order(template)?;

        let mut shape_ids = Vec::new();
        let mut creation_ids = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let candidates = template_slides.iter().cloned().chain(
            template
                .paths()
                .filter(|path| template.slide_number(path).is_some())
                .map(PartName::new),
        );
        for part in candidates {
            if !seen.insert(part.clone()) {
                continue;
            }
            // Slides that do not parse cannot contribute IDs; cloning one fails later.
            let Ok(doc) = template.xml(part.member()) else {
                tracing::trace!(part = %part, "skipping unreadable slide while seeding IDs");
                continue;
            };
            collect_ids(doc.root(), &mut shape_ids, &mut creation_ids);
        }

        tracing::trace!(
            slides = seen.len(),
            max_shape_id = shape_ids.iter().max().copied().unwrap_or(0),
            "seeded identifier allocator"
        );

        Ok(Self {
            template,
            structure,
            template_slides,
            slides_dir: template.slides_dir(),
            ids: IdAllocator::seeded(shape_ids, creation_ids),
        })
    }

    /// Template slides in presentation order.
    #[inline]
    pub fn template_slides(&self) -> &[PartName] {
        &self.template_slides
    }

    /// Directory clones are placed in.
    #[inline]
    pub fn slides_dir(&self) -> &str {
        &self.slides_dir
    }

    /// Source part of a slide type.
    ///
    /// Fails with [`Error::UnknownSlideType`] for undeclared types, and with
    /// [`Error::CorruptArchive`] when the declared source is not in the template.
    pub fn source_of(&self, slide_type: &str) -> Result<PartName> {
        let descriptor = self.structure.require(slide_type)?;

        let part = match (&descriptor.source_path, descriptor.slide_index) {
            (Some(path), _) => PartName::new(path),
            (None, Some(index)) => self.template_slides.get(index).cloned().ok_or_else(|| {
                Error::CorruptArchive(format!(
                    "slide type {slide_type} uses slide_index {index}, template has {} slides",
                    self.template_slides.len()
                ))
            })?,
            (None, None) => {
                return Err(Error::InvalidInput(format!(
                    "slide type {slide_type} has neither source_path nor slide_index"
                )));
            },
        };

        if !self.template.contains(part.member()) {
            return Err(Error::CorruptArchive(format!(
                "slide type {slide_type} references {part}, which the template lacks"
            )));
        }
        Ok(part)
    }

    /// Clone the source of `slide_type` to position `ordinal` (1-based).
    pub fn clone_slide(&mut self, slide_type: &str, ordinal: usize) -> Result<ClonedSlide> {
        let source = self.source_of(slide_type)?;
        let document = self.template.xml(source.member())?;
        let relationships = self.template.relationships(&source)?;
        let handle = SlideHandle::at(slide_type, ordinal, &self.slides_dir);
        self.clone_document(handle, source, document, relationships)
    }

    /// Clone an already-parsed slide (used for built-in fragments).
    pub fn clone_document(
        &mut self,
        handle: SlideHandle,
        source: PartName,
        mut document: XmlDocument,
        relationships: Relationships,
    ) -> Result<ClonedSlide> {
        let remapped = remap_ids(&mut document, &mut self.ids);
        let relationships = retarget(&relationships, source.dir(), handle.part.dir());

        tracing::trace!(
            slide_type = %handle.slide_type,
            ordinal = handle.ordinal,
            source = %source,
            part = %handle.part,
            shapes = remapped,
            relationships = relationships.len(),
            "cloned slide"
        );

        Ok(ClonedSlide {
            handle,
            source,
            document,
            relationships,
        })
    }
}

fn collect_ids(root: &Element, shape_ids: &mut Vec<u32>, creation_ids: &mut Vec<u32>) {
    root.walk(&mut |el| {
        if el.local_name() == "cNvPr" {
            if let Some(id) = el.attr("id").and_then(|v| v.parse().ok()) {
                shape_ids.push(id);
            }
        } else if el.is(namespace::PML_2010, "creationId") {
            if let Some(id) = el.attr("val").and_then(|v| v.parse().ok()) {
                creation_ids.push(id);
            }
        }
    });
}

/// Replace shape and creation IDs, then point in-slide references at the new
/// shape IDs. Returns the number of shapes renumbered.
fn remap_ids(doc: &mut XmlDocument, ids: &mut IdAllocator) -> usize {
    let mut mapping: HashMap<String, String> = HashMap::new();
    let mut count = 0;

    doc.root_mut().walk_mut(&mut |el| {
        if el.local_name() == "cNvPr" {
            if let Some(old) = el.attr("id").map(str::to_string) {
                let new = ids.next_shape_id().to_string();
                mapping.entry(old).or_insert_with(|| new.clone());
                el.set_attr("id", new);
                count += 1;
            }
        } else if el.is(namespace::PML_2010, "creationId") && el.attr("val").is_some() {
            el.set_attr("val", ids.next_creation_id().to_string());
        }
    });

    doc.root_mut().walk_mut(&mut |el| {
        let attr = match el.local_name() {
            "spTgt" | "bldP" | "bldGraphic" | "bldDgm" | "bldOleChart" => "spid",
            "stCxn" | "endCxn" => "id",
            _ => return,
        };
        if let Some(new) = el.attr(attr).and_then(|old| mapping.get(old)).cloned() {
            el.set_attr(attr, new);
        }
    });

    count
}

/// Copy relationships for a slide stored in `to_dir`, dropping unshared ones.
fn retarget(source: &Relationships, from_dir: &str, to_dir: &str) -> Relationships {
    let mut out = Relationships::new(to_dir);
    for rel in source.iter() {
        if UNSHARED_RELATIONSHIPS.contains(&rel.reltype()) {
            continue;
        }
        if rel.is_external() || from_dir == to_dir {
            out.push(rel.clone());
            continue;
        }
        let target = PartName::resolve(from_dir, rel.target_ref()).relative_to(to_dir);
        out.push(Relationship::new(rel.r_id(), rel.reltype(), target));
    }
    out
}
