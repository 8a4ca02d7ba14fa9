/// Presentation-level reading helpers.
///
/// The template's slide order lives in `p:sldIdLst` of the presentation part;
/// each `p:sldId` points at a slide through a relationship ID of the
/// presentation's `.rels` part.
use crate::common::xml::XmlDocument;
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use crate::ooxml::opc::{Archive, ContentTypes, CONTENT_TYPES_MEMBER, PartName};
use std::collections::BTreeSet;

/// Qualified name of the relationship-ID attribute (`r:id`) as declared by `doc`.
pub fn relationship_id_attr(doc: &XmlDocument) -> String {
    match doc.prefix_for(namespace::OFC_RELATIONSHIPS) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:id"),
        _ => "r:id".to_string(),
    }
}

/// Template slides in presentation order.
///
/// Follows `p:sldIdLst`; a package without one falls back to its slide
/// relationships ordered by slide number. A `p:sldId` whose relationship is
/// missing makes the package [`Error::CorruptArchive`].
pub fn slide_order(archive: &Archive) -> Result<Vec<PartName>> {
    let presentation = archive.presentation_part();
    let doc = archive.xml(presentation.member())?;
    let rels = archive.relationships(presentation)?;
    let r_id_attr = relationship_id_attr(&doc);

    let mut slides = Vec::new();
    if let Some(list) = doc.root().child(namespace::PML_MAIN, "sldIdLst") {
        for sld_id in list.elements().filter(|el| el.is(namespace::PML_MAIN, "sldId")) {
            let Some(r_id) = sld_id.attr(&r_id_attr) else {
                continue;
            };
            let part = rels
                .get(r_id)
                .and_then(|rel| rel.target_part(rels.base_dir()))
                .ok_or_else(|| {
                    Error::CorruptArchive(format!("slide list references missing relationship {r_id}"))
                })?;
            slides.push(part);
        }
    }

    if slides.is_empty() {
        slides = rels
            .of_type(rt::SLIDE)
            .filter_map(|rel| rel.target_part(rels.base_dir()))
            .collect();
        slides.sort_by_key(|part| part.idx());
    }
    Ok(slides)
}

/// Every slide part a package knows about, from any of its manifests or by name.
pub fn all_slide_parts(archive: &Archive) -> Result<BTreeSet<PartName>> {
    let mut parts: BTreeSet<PartName> = slide_order(archive)?.into_iter().collect();

    let presentation = archive.presentation_part();
    let rels = archive.relationships(presentation)?;
    parts.extend(
        rels.of_type(rt::SLIDE)
            .filter_map(|rel| rel.target_part(rels.base_dir())),
    );

    let types = ContentTypes::from_document(&archive.xml(CONTENT_TYPES_MEMBER)?);
    parts.extend(types.parts_with_type(ct::PML_SLIDE));

    parts.extend(
        archive
            .paths()
            .filter(|path| archive.slide_number(path).is_some())
            .map(PartName::new),
    );
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::fixtures;

    #[test]
    fn test_slide_order_follows_sld_id_lst() {
        let archive = Archive::open(&fixtures::template_bytes()).unwrap();
        let order: Vec<String> = slide_order(&archive).unwrap().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            order,
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide3.xml",
                "ppt/slides/slide4.xml"
            ]
        );
    }

    #[test]
    fn test_relationship_id_attr() {
        let doc = XmlDocument::parse(fixtures::PRESENTATION_XML.as_bytes()).unwrap();
        assert_eq!(relationship_id_attr(&doc), "r:id");
        let bare = XmlDocument::parse(b"<p:presentation/>").unwrap();
        assert_eq!(relationship_id_attr(&bare), "r:id");
    }

    #[test]
    fn test_all_slide_parts() {
        let archive = Archive::open(&fixtures::template_bytes()).unwrap();
        assert_eq!(all_slide_parts(&archive).unwrap().len(), 4);
    }
}
