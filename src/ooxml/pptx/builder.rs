//! Build orchestration.
//!
//! A build moves through typed stages, each consumed to produce the next:
//!
//! ```text
//! PresentationBuilder::load -> Loaded -> SlidesBuilt -> ManifestsSynced -> BuildResult
//! ```
//!
//! Any failure ends the build with the originating error; there is no
//! partial output. The template archive is only read: each build works on
//! its own copy with the template's slides removed.
//!
//! # Example
//!
//! ```no_run
//! use longan::ooxml::pptx::{BuildOptions, ContentPlan, TemplateStructure, build};
//!
//! # fn main() -> longan::Result<()> {
//! let template = std::fs::read("template.pptx")?;
//! let structure = TemplateStructure::from_json(&std::fs::read_to_string("structure.json")?)?;
//! let plan = ContentPlan::from_json(&std::fs::read_to_string("plan.json")?)?;
//!
//! let result = build(&template, &structure, &plan, None, &BuildOptions::default())?;
//! std::fs::write("deck.pptx", &result.bytes)?;
//! # Ok(())
//! # }
//! ```

use crate::common::{Error, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{Archive, PartName, Relationship};
use crate::ooxml::pptx::cloner::{ClonedSlide, SlideCloner, SlideHandle, UNSHARED_RELATIONSHIPS};
use crate::ooxml::pptx::manifest::{self, SlideList};
use crate::ooxml::pptx::options::BuildOptions;
use crate::ooxml::pptx::package::all_slide_parts;
use crate::ooxml::pptx::plan::{ContentPlan, Roster, SlideInstance};
use crate::ooxml::pptx::resolver::{ListStyle, ResolveReport, Resolver, TokenMap};
use crate::ooxml::pptx::roster::{self, RosterSlide};
use crate::ooxml::pptx::structure::TemplateStructure;
use serde::Serialize;
use std::fmt;

/// Stage a build has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Idle,
    Loaded,
    SlidesBuilt,
    ManifestsSynced,
    Serialized,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Idle => "idle",
            BuildStage::Loaded => "loaded",
            BuildStage::SlidesBuilt => "slides_built",
            BuildStage::ManifestsSynced => "manifests_synced",
            BuildStage::Serialized => "serialized",
        };
        f.write_str(name)
    }
}

/// Output of one build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// `(slide type, archive path)` in final order
    pub slides: Vec<(String, String)>,
    /// One report per slide, in the same order
    pub reports: Vec<ResolveReport>,
}

impl BuildResult {
    /// Total token occurrences replaced over all slides.
    pub fn total_substitutions(&self) -> usize {
        self.reports.iter().map(ResolveReport::total_substitutions).sum()
    }
}

/// One position of the output deck.
#[derive(Debug, Clone, Copy)]
enum Slot<'p> {
    Planned(&'p SlideInstance),
    Roster(&'p Roster),
}

/// Builds decks from one template.
#[derive(Debug, Clone, Copy)]
pub struct PresentationBuilder<'a> {
    template: &'a Archive,
    structure: &'a TemplateStructure,
    options: &'a BuildOptions,
}

impl<'a> PresentationBuilder<'a> {
    pub fn new(template: &'a Archive, structure: &'a TemplateStructure, options: &'a BuildOptions) -> Self {
        Self {
            template,
            structure,
            options,
        }
    }

    /// Run every stage.
    pub fn build(&self, plan: &'a ContentPlan, roster: Option<&'a Roster>) -> Result<BuildResult> {
        self.load(plan, roster)?
            .build_slides()?
            .sync_manifests()?
            .serialize()
    }

    /// Validate the inputs and prepare the working archive.
    ///
    /// Every planned slide type is checked before any slide work, so an
    /// unknown type fails with [`Error::UnknownSlideType`] and a type whose
    /// source the template lacks fails with [`Error::CorruptArchive`].
    pub fn load(&self, plan: &'a ContentPlan, roster: Option<&'a Roster>) -> Result<Loaded<'a>> {
        let cloner = SlideCloner::new(self.template, self.structure)?;

        for instance in &plan.slides {
            cloner.source_of(&instance.slide_type)?;
        }

        let mut slots: Vec<Slot<'a>> = plan.slides.iter().map(Slot::Planned).collect();
        if let Some(roster) = roster.filter(|r| !r.is_empty()) {
            if let RosterSlide::Template(descriptor) = roster::select(self.structure, self.options) {
                cloner.source_of(&descriptor.name)?;
            }
            let at = roster::slot(plan, self.structure, self.options);
            slots.insert(at, Slot::Roster(roster));
        }

        let working = working_copy(self.template)?;

        tracing::debug!(
            stage = %BuildStage::Loaded,
            planned = plan.len(),
            slides = slots.len(),
            entries = working.len(),
            "build loaded"
        );

        Ok(Loaded {
            builder: *self,
            cloner,
            working,
            slots,
        })
    }
}

/// Template copy without slides, plus the validated slot list.
pub struct Loaded<'a> {
    builder: PresentationBuilder<'a>,
    cloner: SlideCloner<'a>,
    working: Archive,
    slots: Vec<Slot<'a>>,
}

impl<'a> Loaded<'a> {
    /// Number of slides the deck will have.
    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slots.len()
    }

    /// Clone and resolve every slot at its ordinal.
    pub fn build_slides(self) -> Result<SlidesBuilt<'a>> {
        let Loaded {
            builder,
            mut cloner,
            mut working,
            slots,
        } = self;
        let style = ListStyle::from(builder.options);

        let mut handles = Vec::with_capacity(slots.len());
        let mut reports = Vec::with_capacity(slots.len());
        let mut previous_layout: Option<Relationship> = None;

        for (i, slot) in slots.into_iter().enumerate() {
            let ordinal = i + 1;
            let (mut clone, tokens) = match slot {
                Slot::Planned(instance) => {
                    let clone = cloner.clone_slide(&instance.slide_type, ordinal)?;
                    let descriptor = builder.structure.get(&instance.slide_type);
                    (clone, TokenMap::from_replacements(&instance.replacements, descriptor))
                },
                Slot::Roster(members) => {
                    let values = roster::replacements(members, &builder.options.roster_title);
                    match roster::select(builder.structure, builder.options) {
                        RosterSlide::Template(descriptor) => {
                            let clone = cloner.clone_slide(&descriptor.name, ordinal)?;
                            (clone, TokenMap::from_replacements(&values, Some(descriptor)))
                        },
                        RosterSlide::BuiltIn => {
                            let layout = match &previous_layout {
                                Some(layout) => layout.clone(),
                                None => first_template_layout(&cloner, builder.template)?,
                            };
                            let clone = built_in_roster(&mut cloner, &layout, ordinal)?;
                            (clone, TokenMap::from_replacements(&values, None))
                        },
                    }
                },
            };

            let report = Resolver::new(&tokens, &style)?.resolve(&mut clone.document);
            tracing::trace!(
                slide_type = %clone.handle.slide_type,
                ordinal,
                substitutions = report.total_substitutions(),
                expanded = report.expanded_paragraphs,
                "resolved slide"
            );

            if let Some(layout) = clone.relationships.first_of_type(rt::SLIDE_LAYOUT) {
                previous_layout = Some(layout.clone());
            }
            store(&mut working, clone, &mut handles);
            reports.push(report);
        }

        tracing::debug!(stage = %BuildStage::SlidesBuilt, slides = handles.len(), "slides built");

        Ok(SlidesBuilt {
            options: builder.options,
            working,
            handles,
            reports,
        })
    }
}

/// Working archive holding every output slide; manifests still stale.
pub struct SlidesBuilt<'a> {
    options: &'a BuildOptions,
    working: Archive,
    handles: Vec<SlideHandle>,
    reports: Vec<ResolveReport>,
}

impl<'a> SlidesBuilt<'a> {
    #[inline]
    pub fn handles(&self) -> &[SlideHandle] {
        &self.handles
    }

    /// Regenerate and verify the manifests.
    pub fn sync_manifests(self) -> Result<ManifestsSynced<'a>> {
        let SlidesBuilt {
            options,
            mut working,
            handles,
            reports,
        } = self;
        let list = manifest::synchronize(&mut working, &handles)?;

        tracing::debug!(stage = %BuildStage::ManifestsSynced, slides = list.len(), "manifests synced");

        Ok(ManifestsSynced {
            options,
            working,
            handles,
            reports,
            list,
        })
    }
}

/// Consistent working archive, ready to be written.
pub struct ManifestsSynced<'a> {
    options: &'a BuildOptions,
    working: Archive,
    handles: Vec<SlideHandle>,
    reports: Vec<ResolveReport>,
    list: SlideList,
}

impl ManifestsSynced<'_> {
    /// The canonical slide list the manifests were written from.
    #[inline]
    pub fn slide_list(&self) -> &SlideList {
        &self.list
    }

    /// The finished archive, before serialization.
    #[inline]
    pub fn archive(&self) -> &Archive {
        &self.working
    }

    /// Write the archive and finish the build.
    pub fn serialize(self) -> Result<BuildResult> {
        let bytes = self.working.serialize(self.options.compression)?;
        let slides = self
            .handles
            .into_iter()
            .map(|h| (h.slide_type, h.part.member().to_string()))
            .collect();

        tracing::debug!(stage = %BuildStage::Serialized, bytes = bytes.len(), "build serialized");

        Ok(BuildResult {
            bytes,
            slides,
            reports: self.reports,
        })
    }
}

/// Copy of the template without its slides and their per-slide parts.
fn working_copy(template: &Archive) -> Result<Archive> {
    let mut working = template.clone();
    let mut removed = 0;

    for slide in all_slide_parts(template)? {
        let rels = template.relationships(&slide)?;
        for rel in rels.iter().filter(|r| !r.is_external() && UNSHARED_RELATIONSHIPS.contains(&r.reltype())) {
            if let Some(part) = rel.target_part(rels.base_dir()) {
                working.remove(&part.rels_member());
                working.remove(part.member());
            }
        }
        working.remove(&slide.rels_member());
        if working.remove(slide.member()).is_some() {
            removed += 1;
        }
    }

    tracing::trace!(removed, entries = working.len(), "prepared working copy");
    Ok(working)
}

/// Layout of the first template slide that has one.
fn first_template_layout(cloner: &SlideCloner<'_>, template: &Archive) -> Result<Relationship> {
    for slide in cloner.template_slides() {
        let rels = template.relationships(slide)?;
        if let Some(layout) = rels.first_of_type(rt::SLIDE_LAYOUT) {
            let target = PartName::resolve(rels.base_dir(), layout.target_ref()).relative_to(cloner.slides_dir());
            return Ok(Relationship::new(layout.r_id(), rt::SLIDE_LAYOUT, target));
        }
    }
    Err(Error::CorruptArchive(
        "no slide layout available for the roster slide".to_string(),
    ))
}

fn built_in_roster(cloner: &mut SlideCloner<'_>, layout: &Relationship, ordinal: usize) -> Result<ClonedSlide> {
    let slides_dir = cloner.slides_dir().to_string();
    let handle = SlideHandle::at(roster::BUILT_IN_TYPE, ordinal, &slides_dir);
    cloner.clone_document(
        handle,
        roster::built_in_source(&slides_dir),
        roster::built_in_document()?,
        roster::built_in_relationships(layout, &slides_dir),
    )
}

fn store(working: &mut Archive, clone: ClonedSlide, handles: &mut Vec<SlideHandle>) {
    let ClonedSlide {
        handle,
        document,
        relationships,
        ..
    } = clone;
    working.put_xml(handle.part.member(), document);
    if !relationships.is_empty() {
        working.put_xml(handle.rels_member.as_str(), relationships.to_document());
    }
    handles.push(handle);
}

/// Build a deck from template bytes.
pub fn build(
    template: &[u8],
    structure: &TemplateStructure,
    plan: &ContentPlan,
    roster: Option<&Roster>,
    options: &BuildOptions,
) -> Result<BuildResult> {
    let template = Archive::open(template)?;
    build_from_archive(&template, structure, plan, roster, options)
}

/// Build a deck from an already opened template, e.g. one held by a
/// [`TemplateCache`](crate::ooxml::pptx::TemplateCache).
pub fn build_from_archive(
    template: &Archive,
    structure: &TemplateStructure,
    plan: &ContentPlan,
    roster: Option<&Roster>,
    options: &BuildOptions,
) -> Result<BuildResult> {
    PresentationBuilder::new(template, structure, options).build(plan, roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlDocument;
    use crate::ooxml::opc::Compression;
    use crate::ooxml::opc::constants::namespace;
    use crate::ooxml::pptx::fixtures;
    use crate::ooxml::pptx::plan::{ListItem, RosterMember};
    use std::collections::HashSet;

    fn plan(types: &[&str]) -> ContentPlan {
        ContentPlan::new(types.iter().map(|t| SlideInstance::new(*t)).collect())
    }

    fn roster_of(n: usize) -> Roster {
        Roster::new((1..=n).map(|i| RosterMember::new(format!("Member {i}"), "Role")).collect())
    }

    fn types(result: &BuildResult) -> Vec<&str> {
        result.slides.iter().map(|(t, _)| t.as_str()).collect()
    }

    fn paragraph_texts(doc: &XmlDocument) -> Vec<String> {
        doc.root()
            .descendants(namespace::DML_MAIN, "p")
            .iter()
            .map(|p| p.descendants(namespace::DML_MAIN, "t").iter().map(|t| t.text()).collect())
            .collect()
    }

    fn shape_ids(doc: &XmlDocument) -> HashSet<String> {
        doc.root()
            .descendants(namespace::PML_MAIN, "cNvPr")
            .iter()
            .filter_map(|el| el.attr("id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_scenario_four_slides() {
        let structure = fixtures::structure();
        let mut content = plan(&["TITLE", "BULLETS_4", "BULLETS_4", "CLOSE"]);
        content.slides[0] = SlideInstance::new("TITLE").with("{{TITLE_TITLE}}", "Quarterly review");
        content.slides[1] = SlideInstance::new("BULLETS_4")
            .with("{{TITLE_BULLETS_4}}", "Agenda")
            .with("{{ITEMS}}", vec![ListItem::bullet("One"), ListItem::numbered("Two")]);

        let result = build(
            &fixtures::template_bytes(),
            &structure,
            &content,
            None,
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(types(&result), vec!["TITLE", "BULLETS_4", "BULLETS_4", "CLOSE"]);
        let paths: Vec<&str> = result.slides.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide3.xml",
                "ppt/slides/slide4.xml"
            ]
        );

        let output = Archive::open(&result.bytes).unwrap();
        let views = manifest::inspect(&output).unwrap();
        assert_eq!(views.presentation.len(), 4);
        assert_eq!(views.presentation, views.relationships);
        assert_eq!(views.presentation, views.content_types);

        let second = output.xml("ppt/slides/slide2.xml").unwrap();
        let third = output.xml("ppt/slides/slide3.xml").unwrap();
        assert!(shape_ids(&second).is_disjoint(&shape_ids(&third)));

        let texts = paragraph_texts(&second);
        assert!(texts.contains(&"Agenda".to_string()));
        assert!(texts.contains(&"One".to_string()));
        assert!(texts.contains(&"Two".to_string()));
        // No value given: the token stays literal.
        assert!(texts.contains(&"{{BULLET_1}}".to_string()));
        assert!(paragraph_texts(&third).contains(&"{{TITLE_BULLETS_4}}".to_string()));

        assert_eq!(result.reports.len(), 4);
        assert_eq!(result.reports[1].list_items, 2);
        assert_eq!(result.total_substitutions(), 3);
    }

    #[test]
    fn test_notes_and_template_slides_removed() {
        let result = build(
            &fixtures::template_bytes(),
            &fixtures::structure(),
            &plan(&["BULLETS_4"]),
            None,
            &BuildOptions::default(),
        )
        .unwrap();
        let output = Archive::open(&result.bytes).unwrap();

        assert!(output.contains("ppt/slides/slide1.xml"));
        assert!(!output.contains("ppt/slides/slide2.xml"));
        assert!(!output.contains("ppt/notesSlides/notesSlide1.xml"));
        assert!(!output.contains("ppt/notesSlides/_rels/notesSlide1.xml.rels"));
        assert!(output.contains("ppt/media/image1.png"));

        let rels = output.relationships(&PartName::new("ppt/slides/slide1.xml")).unwrap();
        assert!(rels.first_of_type(rt::NOTES_SLIDE).is_none());
        assert!(rels.first_of_type(rt::IMAGE).is_some());
    }

    #[test]
    fn test_roster_before_closing_slide() {
        let result = build(
            &fixtures::template_bytes(),
            &fixtures::structure_with_team(),
            &plan(&["TITLE", "BULLETS_4", "CLOSE"]),
            Some(&roster_of(3)),
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(types(&result), vec!["TITLE", "BULLETS_4", "TEAM", "CLOSE"]);
        let output = Archive::open(&result.bytes).unwrap();
        let texts = paragraph_texts(&output.xml("ppt/slides/slide3.xml").unwrap());
        assert_eq!(texts[0], "Team");
        assert_eq!(texts[1], "Member 1 \u{2013} Role");
        assert_eq!(texts.len(), 4);
    }

    #[test]
    fn test_built_in_roster_appended_without_closing_slide() {
        let result = build(
            &fixtures::template_bytes(),
            &fixtures::structure(),
            &plan(&["TITLE", "BULLETS_4"]),
            Some(&roster_of(3)),
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(types(&result), vec!["TITLE", "BULLETS_4", roster::BUILT_IN_TYPE]);
        let output = Archive::open(&result.bytes).unwrap();
        let rels = output.relationships(&PartName::new("ppt/slides/slide3.xml")).unwrap();
        assert_eq!(rels.len(), 1);
        let layout = rels.first_of_type(rt::SLIDE_LAYOUT).unwrap();
        assert_eq!(
            layout.target_part(rels.base_dir()).unwrap().member(),
            "ppt/slideLayouts/slideLayout1.xml"
        );

        let ids: Vec<HashSet<String>> = (1..=3)
            .map(|n| shape_ids(&output.xml(&format!("ppt/slides/slide{n}.xml")).unwrap()))
            .collect();
        assert!(ids[2].is_disjoint(&ids[0]));
        assert!(ids[2].is_disjoint(&ids[1]));
    }

    #[test]
    fn test_empty_roster_adds_nothing() {
        let result = build(
            &fixtures::template_bytes(),
            &fixtures::structure_with_team(),
            &plan(&["TITLE", "CLOSE"]),
            Some(&Roster::default()),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(types(&result), vec!["TITLE", "CLOSE"]);
    }

    #[test]
    fn test_scalar_for_list_token_is_coerced() {
        let structure = fixtures::structure();
        let content = ContentPlan::new(vec![
            SlideInstance::new("BULLETS_4").with("{{ITEMS}}", "Only item"),
            SlideInstance::new("BULLETS_4").with("{{ITEMS}}", ""),
        ]);
        let result = build_from_archive(
            &Archive::open(&fixtures::template_bytes()).unwrap(),
            &structure,
            &content,
            None,
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(result.reports[0].list_items, 1);
        assert_eq!(result.reports[0].expanded_paragraphs, 1);
        assert_eq!(result.reports[1].list_items, 0);
        assert_eq!(result.reports[1].expanded_paragraphs, 1);
    }

    #[test]
    fn test_unknown_type_fails_before_slide_work() {
        let template = Archive::open(&fixtures::template_bytes()).unwrap();
        let structure = fixtures::structure();
        let options = BuildOptions::default();
        let content = plan(&["TITLE", "MISSING"]);
        let builder = PresentationBuilder::new(&template, &structure, &options);
        assert!(matches!(
            builder.load(&content, None),
            Err(Error::UnknownSlideType(ref name)) if name == "MISSING"
        ));
    }

    #[test]
    fn test_truncated_template_is_corrupt() {
        let bytes = fixtures::template_bytes();
        let result = build(
            &bytes[..bytes.len() / 3],
            &fixtures::structure(),
            &plan(&["TITLE"]),
            None,
            &BuildOptions::default(),
        );
        assert!(matches!(result, Err(Error::CorruptArchive(_))));
    }

    #[test]
    fn test_stages_and_template_reuse() {
        let template = Archive::open(&fixtures::template_bytes()).unwrap();
        let structure = fixtures::structure();
        let options = BuildOptions {
            compression: Compression::Stored,
            ..BuildOptions::default()
        };
        let content = plan(&["TITLE", "CLOSE"]);
        let builder = PresentationBuilder::new(&template, &structure, &options);

        let loaded = builder.load(&content, None).unwrap();
        assert_eq!(loaded.slide_count(), 2);
        let built = loaded.build_slides().unwrap();
        assert_eq!(built.handles().len(), 2);
        let synced = built.sync_manifests().unwrap();
        assert_eq!(synced.slide_list().entries[1].slide_id, 257);
        assert!(synced.archive().contains("ppt/slides/slide2.xml"));
        let first = synced.serialize().unwrap();

        // The template is untouched and can serve another build.
        assert!(template.contains("ppt/slides/slide4.xml"));
        assert!(template.contains("ppt/notesSlides/notesSlide1.xml"));
        let second = builder.build(&content, None).unwrap();
        assert_eq!(first.slides, second.slides);
        assert!(Archive::open(&second.bytes).is_ok());
    }
}
