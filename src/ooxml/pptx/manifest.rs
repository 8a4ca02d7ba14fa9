//! Manifest synchronization.
//!
//! Three parts describe the slide set of a package: `p:sldIdLst` in the
//! presentation part, the slide relationships of the presentation, and the
//! slide overrides of `[Content_Types].xml`. After a rebuild all three are
//! regenerated from one [`SlideList`] and then read back independently to
//! check they agree.

use crate::common::xml::{Element, Node, XmlDocument};
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use crate::ooxml::opc::{Archive, CONTENT_TYPES_MEMBER, ContentTypes, PartName, Relationship};
use crate::ooxml::pptx::cloner::SlideHandle;
use crate::ooxml::pptx::package::relationship_id_attr;
use serde::Serialize;
use std::collections::BTreeSet;

/// First slide ID PowerPoint accepts.
pub const FIRST_SLIDE_ID: u32 = 256;

/// Elements that precede `p:sldIdLst` in a presentation part.
const BEFORE_SLIDE_LIST: [&str; 3] = ["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"];

/// One slide of the final deck as the manifests see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideEntry {
    pub part: PartName,
    /// Presentation relationship ID
    pub r_id: String,
    /// `p:sldId/@id`
    pub slide_id: u32,
}

/// Canonical ordered slide list the manifests are projected from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlideList {
    pub entries: Vec<SlideEntry>,
}

impl SlideList {
    /// Assign relationship IDs above `max_r_id` and slide IDs from 256.
    pub fn assign(parts: impl IntoIterator<Item = PartName>, max_r_id: u32) -> Self {
        let entries = parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| SlideEntry {
                part,
                r_id: format!("rId{}", max_r_id as usize + 1 + i),
                slide_id: FIRST_SLIDE_ID + i as u32,
            })
            .collect();
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Slide parts as each manifest lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestViews {
    /// `p:sldIdLst` order
    pub presentation: Vec<PartName>,
    /// Slide relationships of the presentation part
    pub relationships: Vec<PartName>,
    /// Slide overrides of the content-type registry
    pub content_types: Vec<PartName>,
}

/// Rewrite the three manifests for `slides`, then verify them.
pub fn synchronize(archive: &mut Archive, slides: &[SlideHandle]) -> Result<SlideList> {
    let presentation = archive.presentation_part().clone();

    let mut rels = archive.relationships(&presentation)?;
    rels.retain(|rel| rel.reltype() != rt::SLIDE);
    let list = SlideList::assign(slides.iter().map(|s| s.part.clone()), rels.max_r_id());

    project_presentation(archive.xml_mut(presentation.member())?, &list);

    for entry in &list.entries {
        rels.push(Relationship::new(
            entry.r_id.as_str(),
            rt::SLIDE,
            entry.part.relative_to(presentation.dir()),
        ));
    }
    archive.put_xml(presentation.rels_member(), rels.to_document());

    let mut types = ContentTypes::from_document(&archive.xml(CONTENT_TYPES_MEMBER)?);
    types.retain_overrides(|(part, content_type)| content_type != ct::PML_SLIDE && archive.contains(part.member()));
    for entry in &list.entries {
        types.set_override(&entry.part, ct::PML_SLIDE);
    }
    archive.put_xml(CONTENT_TYPES_MEMBER, types.to_document());

    verify(archive, &list)?;

    tracing::debug!(slides = list.len(), "manifests synchronized");
    Ok(list)
}

fn project_presentation(doc: &mut XmlDocument, list: &SlideList) {
    if doc.prefix_for(namespace::OFC_RELATIONSHIPS).is_none() {
        doc.root_mut().set_attr("xmlns:r", namespace::OFC_RELATIONSHIPS);
    }
    let r_id_attr = relationship_id_attr(doc);
    let root = doc.root_mut();

    let mut slide_list = Element::new_like(root, "sldIdLst");
    for entry in &list.entries {
        let mut sld_id = Element::new_like(root, "sldId");
        sld_id.set_attr("id", entry.slide_id.to_string());
        sld_id.set_attr(&r_id_attr, entry.r_id.as_str());
        slide_list.push_element(sld_id);
    }

    let children = root.children_mut();
    let is_pml = |node: &Node, names: &[&str]| {
        node.as_element()
            .is_some_and(|el| el.namespace() == Some(namespace::PML_MAIN) && names.contains(&el.local_name()))
    };

    children.retain(|node| !is_pml(node, &["custShowLst"]));

    match children.iter().position(|node| is_pml(node, &["sldIdLst"])) {
        Some(at) => children[at] = Node::Element(slide_list),
        None => {
            let at = children
                .iter()
                .rposition(|node| is_pml(node, &BEFORE_SLIDE_LIST))
                .map(|i| i + 1)
                .or_else(|| children.iter().position(|node| node.as_element().is_some()))
                .unwrap_or(children.len());
            children.insert(at, Node::Element(slide_list));
        },
    }

    let slide_ids: Vec<u32> = list.entries.iter().map(|e| e.slide_id).collect();
    root.walk_mut(&mut |el| {
        if el.is(namespace::PML_2010, "sectionLst") {
            rewrite_sections(el, &slide_ids);
        }
    });
}

/// Keep the first section and give it every slide; drop the rest.
fn rewrite_sections(section_list: &mut Element, slide_ids: &[u32]) {
    let mut first = true;
    section_list.children_mut().retain(|node| match node.as_element() {
        Some(el) if el.is(namespace::PML_2010, "section") => std::mem::replace(&mut first, false),
        _ => true,
    });

    let Some(section) = section_list.child_mut(namespace::PML_2010, "section") else {
        return;
    };
    let mut ids = Element::new_like(section, "sldIdLst");
    for id in slide_ids {
        let mut sld_id = Element::new_like(section, "sldId");
        sld_id.set_attr("id", id.to_string());
        ids.push_element(sld_id);
    }

    let children = section.children_mut();
    match children
        .iter()
        .position(|node| node.as_element().is_some_and(|el| el.is(namespace::PML_2010, "sldIdLst")))
    {
        Some(at) => children[at] = Node::Element(ids),
        None => children.insert(0, Node::Element(ids)),
    }
}

/// Read the slide set from each manifest independently.
pub fn inspect(archive: &Archive) -> Result<ManifestViews> {
    let presentation_part = archive.presentation_part();
    let doc = archive.xml(presentation_part.member())?;
    let rels = archive.relationships(presentation_part)?;
    let r_id_attr = relationship_id_attr(&doc);

    let mut presentation = Vec::new();
    if let Some(list) = doc.root().child(namespace::PML_MAIN, "sldIdLst") {
        for sld_id in list.elements().filter(|el| el.is(namespace::PML_MAIN, "sldId")) {
            let r_id = sld_id.attr(&r_id_attr).ok_or_else(|| {
                Error::ManifestMismatch("p:sldId without relationship ID".to_string())
            })?;
            let rel = rels
                .get(r_id)
                .filter(|rel| rel.reltype() == rt::SLIDE)
                .ok_or_else(|| Error::ManifestMismatch(format!("p:sldId references unknown slide relationship {r_id}")))?;
            presentation.extend(rel.target_part(rels.base_dir()));
        }
    }

    let relationships = rels
        .of_type(rt::SLIDE)
        .filter_map(|rel| rel.target_part(rels.base_dir()))
        .collect();

    let types = ContentTypes::from_document(&archive.xml(CONTENT_TYPES_MEMBER)?);
    let content_types = types.parts_with_type(ct::PML_SLIDE);

    Ok(ManifestViews {
        presentation,
        relationships,
        content_types,
    })
}

/// Check that the manifests agree with each other and with the archive.
pub fn verify(archive: &Archive, list: &SlideList) -> Result<()> {
    let views = inspect(archive)?;
    let expected: BTreeSet<&PartName> = list.entries.iter().map(|e| &e.part).collect();

    for (name, view) in [
        ("slide list", &views.presentation),
        ("presentation relationships", &views.relationships),
        ("content types", &views.content_types),
    ] {
        let actual: BTreeSet<&PartName> = view.iter().collect();
        if actual.len() != view.len() {
            return Err(Error::ManifestMismatch(format!("{name} lists a slide twice")));
        }
        if actual != expected {
            return Err(Error::ManifestMismatch(format!(
                "{name} has {} slides, expected {}",
                actual.len(),
                expected.len()
            )));
        }
    }

    if let Some(missing) = expected.iter().find(|part| !archive.contains(part.member())) {
        return Err(Error::ManifestMismatch(format!("{missing} is listed but not in the archive")));
    }

    let types = ContentTypes::from_document(&archive.xml(CONTENT_TYPES_MEMBER)?);
    if let Some((orphan, _)) = types.overrides().iter().find(|(part, _)| !archive.contains(part.member())) {
        return Err(Error::ManifestMismatch(format!("content type override for missing part {orphan}")));
    }
    Ok(())
}
