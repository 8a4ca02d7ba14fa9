//! In-memory template package shared by unit tests.
//!
//! Four slides: a title slide, a bulleted content slide carrying a notes
//! slide, an image, a connector and an animation, a closing slide and a team
//! slide. Slide IDs 256..=259, relationships rId2..=rId5.

use crate::ooxml::opc::constants::namespace;
use crate::ooxml::pptx::structure::{PlaceholderKind, SlideRole, SlideTypeDescriptor, TemplateStructure};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

pub const A: &str = namespace::DML_MAIN;

const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slides/slide3.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slides/slide4.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const CORE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Fixture</dc:title></cp:coreProperties>"#;

pub const PRESENTATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/><p:sldId id="258" r:id="rId4"/><p:sldId id="259" r:id="rId5"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/><p:custShowLst><p:custShow name="Short" id="0"><p:sldLst><p:sld r:id="rId3"/></p:sldLst></p:custShow></p:custShowLst><p:extLst><p:ext uri="{521415D9-36F7-43E2-AB2F-B90AF26B5E84}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"><p14:section name="Intro" id="{6F1A3E0B-0001-4C1B-9A55-000000000001}"><p14:sldIdLst><p14:sldId id="256"/><p14:sldId id="257"/></p14:sldIdLst></p14:section><p14:section name="Outro" id="{6F1A3E0B-0002-4C1B-9A55-000000000002}"><p14:sldIdLst><p14:sldId id="258"/><p14:sldId id="259"/></p14:sldIdLst></p14:section></p14:sectionLst></p:ext></p:extLst></p:presentation>"#;

const PRESENTATION_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/><Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide3.xml"/><Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide4.xml"/><Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/></Relationships>"#;

const SLIDE_OPEN: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

const SLIDE_LAYOUT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

const SLIDE2_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/></Relationships>"#;

const NOTES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:notes>"#;

const NOTES_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="../slides/slide2.xml"/></Relationships>"#;

const LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="obj"><p:cSld name="Title and Content"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:sldLayout>"#;

const LAYOUT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const MASTER_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Fixture"><a:themeElements/></a:theme>"#;

/// Not a decodable image; only the bytes matter.
const IMAGE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

fn text_shape(id: u32, name: &str, ph: &str, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph {ph}/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
    )
}

fn run_paragraph(text: &str) -> String {
    format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{text}</a:t></a:r></a:p>"#)
}

fn slide(shapes: &str, tail: &str) -> String {
    format!(r#"{DECL}
{SLIDE_OPEN}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>{tail}</p:sld>"#)
}

fn creation_id(val: u32) -> String {
    format!(
        r#"<p:extLst><p:ext uri="{{BB962C8B-B14F-4D97-AF65-F5344CB8AC3E}}"><p14:creationId xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main" val="{val}"/></p:ext></p:extLst>"#
    )
}

fn title_slide() -> String {
    let shapes = text_shape(2, "Title 1", r#"type="ctrTitle""#, &run_paragraph("{{TITLE_TITLE}}"))
        + &text_shape(3, "Subtitle 2", r#"type="subTitle" idx="1""#, &run_paragraph("{{SUBTITLE}}"));
    slide(&shapes, &creation_id(1_000_001))
}

fn bullets_slide() -> String {
    let title = r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{{TITLE_</a:t></a:r><a:r><a:rPr lang="en-US" b="1"/><a:t>BULLETS_4}}</a:t></a:r></a:p>"#;
    let body = (1..=4)
        .map(|n| run_paragraph(&format!("{{{{BULLET_{n}}}}}")))
        .collect::<String>()
        + r#"<a:p><a:pPr lvl="1"><a:defRPr/></a:pPr><a:r><a:rPr lang="en-US"/><a:t>{{ITEMS}}</a:t></a:r></a:p>"#;
    let connector = r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="4" name="Connector 3"/><p:cNvCxnSpPr><a:stCxn id="2" idx="2"/><a:endCxn id="3" idx="0"/></p:cNvCxnSpPr><p:nvPr/></p:nvCxnSpPr><p:spPr/></p:cxnSp>"#;
    let picture = r#"<p:pic><p:nvPicPr><p:cNvPr id="5" name="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId3"/></p:blipFill><p:spPr/></p:pic>"#;
    let timing = r#"<p:timing><p:tnLst><p:par><p:cTn id="1" dur="indefinite" restart="never" nodeType="tmRoot"><p:childTnLst><p:set><p:cBhvr><p:cTn id="2" dur="1" fill="hold"/><p:tgtEl><p:spTgt spid="3"/></p:tgtEl></p:cBhvr></p:set></p:childTnLst></p:cTn></p:par></p:tnLst><p:bldLst><p:bldP spid="3" grpId="0" build="p"/></p:bldLst></p:timing>"#;

    let shapes = text_shape(2, "Title 1", r#"type="title""#, title)
        + &text_shape(3, "Body", r#"idx="1""#, &body)
        + connector
        + picture;
    slide(&shapes, &(timing.to_string() + &creation_id(1_000_002)))
}

fn closing_slide() -> String {
    let shapes = text_shape(2, "Title 1", r#"type="title""#, &run_paragraph("{{TITLE_CLOSE}}"));
    slide(&shapes, &creation_id(1_000_003))
}

fn team_slide() -> String {
    let shapes = text_shape(2, "Title 1", r#"type="title""#, &run_paragraph("{{TITLE_TEAM}}"))
        + &text_shape(3, "Members", r#"idx="1""#, &run_paragraph("{{TEAM_MEMBERS}}"));
    slide(&shapes, &creation_id(1_000_004))
}

/// Every member of the fixture package, in archive order.
pub fn template_parts() -> Vec<(String, Vec<u8>)> {
    let text: Vec<(&str, String)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("docProps/core.xml", CORE_XML.to_string()),
        ("ppt/presentation.xml", PRESENTATION_XML.to_string()),
        ("ppt/_rels/presentation.xml.rels", PRESENTATION_RELS_XML.to_string()),
        ("ppt/slides/slide1.xml", title_slide()),
        ("ppt/slides/_rels/slide1.xml.rels", SLIDE_LAYOUT_RELS_XML.to_string()),
        ("ppt/slides/slide2.xml", bullets_slide()),
        ("ppt/slides/_rels/slide2.xml.rels", SLIDE2_RELS_XML.to_string()),
        ("ppt/slides/slide3.xml", closing_slide()),
        ("ppt/slides/_rels/slide3.xml.rels", SLIDE_LAYOUT_RELS_XML.to_string()),
        ("ppt/slides/slide4.xml", team_slide()),
        ("ppt/slides/_rels/slide4.xml.rels", SLIDE_LAYOUT_RELS_XML.to_string()),
        ("ppt/notesSlides/notesSlide1.xml", NOTES_XML.to_string()),
        ("ppt/notesSlides/_rels/notesSlide1.xml.rels", NOTES_RELS_XML.to_string()),
        ("ppt/slideLayouts/slideLayout1.xml", LAYOUT_XML.to_string()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", LAYOUT_RELS_XML.to_string()),
        ("ppt/slideMasters/slideMaster1.xml", MASTER_XML.to_string()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels", MASTER_RELS_XML.to_string()),
        ("ppt/theme/theme1.xml", THEME_XML.to_string()),
    ];
    let mut parts: Vec<(String, Vec<u8>)> = text
        .into_iter()
        .map(|(name, xml)| (name.to_string(), xml.into_bytes()))
        .collect();
    parts.push(("ppt/media/image1.png".to_string(), IMAGE_PNG.to_vec()));
    parts
}

/// Write members into a ZIP container.
pub fn zip_parts(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in parts {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A ZIP container holding only the given text members.
pub fn package_bytes(parts: &[(&str, &str)]) -> Vec<u8> {
    let owned: Vec<(String, Vec<u8>)> = parts
        .iter()
        .map(|(name, text)| (name.to_string(), text.as_bytes().to_vec()))
        .collect();
    zip_parts(&owned)
}

/// The complete fixture template.
pub fn template_bytes() -> Vec<u8> {
    zip_parts(&template_parts())
}

/// Slide types of the fixture, without a roster type.
pub fn structure() -> TemplateStructure {
    TemplateStructure::new(vec![
        SlideTypeDescriptor::at_index("TITLE", 0)
            .with_role(SlideRole::Title)
            .with_placeholder("{{TITLE_TITLE}}", PlaceholderKind::Scalar)
            .with_placeholder("{{SUBTITLE}}", PlaceholderKind::Scalar),
        SlideTypeDescriptor::at_path("BULLETS_4", "ppt/slides/slide2.xml")
            .with_role(SlideRole::Content)
            .with_placeholder("{{TITLE_BULLETS_4}}", PlaceholderKind::Scalar)
            .with_placeholder("{{ITEMS}}", PlaceholderKind::List),
        SlideTypeDescriptor::at_index("CLOSE", 2)
            .with_role(SlideRole::Closing)
            .with_placeholder("{{TITLE_CLOSE}}", PlaceholderKind::Scalar),
    ])
}

/// [`structure`] plus the team slide.
pub fn structure_with_team() -> TemplateStructure {
    let mut structure = structure();
    structure.slides.push(
        SlideTypeDescriptor::at_index("TEAM", 3)
            .with_role(SlideRole::Roster)
            .with_placeholder("{{TITLE_TEAM}}", PlaceholderKind::Scalar)
            .with_placeholder("{{TEAM_MEMBERS}}", PlaceholderKind::List),
    );
    structure
}
