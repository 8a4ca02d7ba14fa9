//! The roster slide: an auxiliary team slide added when roster data is given.
//!
//! Its content is plain replacements, so it goes through the same resolver as
//! planned slides. The slide itself comes from the structure (a type with the
//! `roster` role, or one named like [`BuildOptions::roster_slide_type`]); a
//! template without one gets a built-in fragment on the layout of the last
//! planned slide.

use crate::common::xml::{XmlDocument, XmlError};
use crate::common::{Error, Result};
use crate::ooxml::opc::{PartName, Relationship, Relationships};
use crate::ooxml::pptx::options::BuildOptions;
use crate::ooxml::pptx::plan::{ContentPlan, ListItem, ReplacementValue, Replacements, Roster};
use crate::ooxml::pptx::structure::{SlideRole, SlideTypeDescriptor, TemplateStructure};
use once_cell::sync::Lazy;

pub const TITLE_TOKEN: &str = "{{TITLE_TEAM}}";
/// One bullet per member, `name – role`
pub const MEMBERS_TOKEN: &str = "{{TEAM_MEMBERS}}";
pub const NAMES_TOKEN: &str = "{{TEAM_NAMES}}";
pub const ROLES_TOKEN: &str = "{{TEAM_ROLES}}";

/// Slide type reported for the built-in roster slide.
pub const BUILT_IN_TYPE: &str = "ROSTER";

const MEMBER_SEPARATOR: &str = " \u{2013} ";

const BUILT_IN_SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{{TITLE_TEAM}}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr><a:normAutofit/></a:bodyPr><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{{TEAM_MEMBERS}}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#;

static BUILT_IN: Lazy<std::result::Result<XmlDocument, XmlError>> =
    Lazy::new(|| XmlDocument::parse(BUILT_IN_SLIDE.as_bytes()));

/// Replacements for a roster slide.
pub fn replacements(roster: &Roster, title: &str) -> Replacements {
    let members = roster
        .members
        .iter()
        .map(|m| match m.role.trim() {
            "" => ListItem::bullet(m.name.as_str()),
            role => ListItem::bullet(format!("{}{MEMBER_SEPARATOR}{role}", m.name)),
        })
        .collect::<Vec<_>>();
    let names = roster.members.iter().map(|m| ListItem::text(m.name.as_str())).collect::<Vec<_>>();
    let roles = roster.members.iter().map(|m| ListItem::text(m.role.as_str())).collect::<Vec<_>>();

    let mut out = Replacements::new();
    out.insert(TITLE_TOKEN.to_string(), ReplacementValue::Text(title.to_string()));
    out.insert(MEMBERS_TOKEN.to_string(), ReplacementValue::List(members));
    out.insert(NAMES_TOKEN.to_string(), ReplacementValue::List(names));
    out.insert(ROLES_TOKEN.to_string(), ReplacementValue::List(roles));
    out
}

/// Where the roster slide comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSlide<'s> {
    Template(&'s SlideTypeDescriptor),
    BuiltIn,
}

impl RosterSlide<'_> {
    /// Slide type name reported for the roster slide.
    pub fn slide_type(&self) -> &str {
        match self {
            RosterSlide::Template(descriptor) => &descriptor.name,
            RosterSlide::BuiltIn => BUILT_IN_TYPE,
        }
    }
}

/// Pick the roster slide: a `roster` role wins over the configured type name.
pub fn select<'s>(structure: &'s TemplateStructure, options: &BuildOptions) -> RosterSlide<'s> {
    structure
        .with_role(SlideRole::Roster)
        .or_else(|| structure.get(&options.roster_slide_type))
        .map_or(RosterSlide::BuiltIn, RosterSlide::Template)
}

/// Index in the plan the roster slide is inserted at: before the last closing
/// slide, or at the end.
pub fn slot(plan: &ContentPlan, structure: &TemplateStructure, options: &BuildOptions) -> usize {
    plan.slides
        .iter()
        .rposition(|s| structure.is_closing(&s.slide_type, &options.closing_slide_type))
        .unwrap_or(plan.slides.len())
}

/// A fresh copy of the built-in roster fragment.
pub fn built_in_document() -> Result<XmlDocument> {
    BUILT_IN
        .as_ref()
        .map(Clone::clone)
        .map_err(|e| Error::resolution("built-in roster slide", e))
}

/// Pseudo source part of the built-in fragment, inside `slides_dir`.
pub fn built_in_source(slides_dir: &str) -> PartName {
    PartName::new(format!("{slides_dir}/slideRoster.xml"))
}

/// Relationships of the built-in fragment: only its layout.
pub fn built_in_relationships(layout: &Relationship, slides_dir: &str) -> Relationships {
    let mut rels = Relationships::new(slides_dir);
    rels.push(Relationship::new("rId1", layout.reltype(), layout.target_ref()));
    rels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::{namespace, relationship_type as rt};
    use crate::ooxml::pptx::fixtures;
    use crate::ooxml::pptx::plan::{ItemType, RosterMember, SlideInstance};
    use crate::ooxml::pptx::resolver::{ListStyle, TokenMap, resolve};

    fn roster() -> Roster {
        Roster::new(vec![
            RosterMember::new("Ada", "Engineer"),
            RosterMember::new("Grace", ""),
            RosterMember::new("Linus", "Maintainer"),
        ])
    }

    fn plan(types: &[&str]) -> ContentPlan {
        ContentPlan::new(types.iter().map(|t| SlideInstance::new(*t)).collect())
    }

    #[test]
    fn test_replacements() {
        let values = replacements(&roster(), "Our team");
        assert_eq!(values[TITLE_TOKEN], ReplacementValue::Text("Our team".to_string()));

        let ReplacementValue::List(members) = &values[MEMBERS_TOKEN] else {
            panic!("members should be a list");
        };
        let text: Vec<&str> = members.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(text, vec!["Ada \u{2013} Engineer", "Grace", "Linus \u{2013} Maintainer"]);
        assert!(members.iter().all(|m| m.item_type == ItemType::Bullet));

        let ReplacementValue::List(names) = &values[NAMES_TOKEN] else {
            panic!("names should be a list");
        };
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|m| m.item_type == ItemType::Text));
    }

    #[test]
    fn test_select_prefers_role_then_name() {
        let options = BuildOptions::default();
        assert_eq!(select(&fixtures::structure(), &options), RosterSlide::BuiltIn);

        let with_team = fixtures::structure_with_team();
        assert_eq!(select(&with_team, &options).slide_type(), "TEAM");

        let mut by_name = fixtures::structure();
        by_name.slides.push(SlideTypeDescriptor::at_index("PEOPLE", 3));
        let options = BuildOptions {
            roster_slide_type: "PEOPLE".to_string(),
            ..BuildOptions::default()
        };
        assert_eq!(select(&by_name, &options).slide_type(), "PEOPLE");
    }

    #[test]
    fn test_slot_before_last_closing() {
        let structure = fixtures::structure();
        let options = BuildOptions::default();
        assert_eq!(slot(&plan(&["TITLE", "BULLETS_4", "CLOSE"]), &structure, &options), 2);
        assert_eq!(slot(&plan(&["TITLE", "CLOSE", "BULLETS_4", "CLOSE"]), &structure, &options), 3);
        assert_eq!(slot(&plan(&["TITLE", "BULLETS_4"]), &structure, &options), 2);
        assert_eq!(slot(&plan(&[]), &structure, &options), 0);
    }

    #[test]
    fn test_built_in_fragment_resolves() {
        let mut doc = built_in_document().unwrap();
        let tokens = TokenMap::from_replacements(&replacements(&roster(), "Team"), None);
        let report = resolve(&mut doc, &tokens, &ListStyle::default()).unwrap();

        assert_eq!(report.list_items, 3);
        let paragraphs = doc.root().descendants(namespace::DML_MAIN, "p");
        let text: Vec<String> = paragraphs
            .iter()
            .map(|p| p.descendants(namespace::DML_MAIN, "t").iter().map(|t| t.text()).collect())
            .collect();
        assert_eq!(text[0], "Team");
        assert_eq!(&text[1..], &["Ada \u{2013} Engineer", "Grace", "Linus \u{2013} Maintainer"]);
    }

    #[test]
    fn test_built_in_relationships() {
        let layout = Relationship::new("rId7", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let rels = built_in_relationships(&layout, "ppt/slides");
        assert_eq!(rels.len(), 1);
        let rel = rels.get("rId1").unwrap();
        assert_eq!(rel.target_part(rels.base_dir()).unwrap().member(), "ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(built_in_source("ppt/slides").dir(), "ppt/slides");
    }
}
