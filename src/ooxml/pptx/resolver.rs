//! Placeholder resolution inside slide trees.
//!
//! Tokens such as `{{TITLE}}` are literal text in DrawingML runs. Authoring
//! tools often split one token over several runs (spell-check marks, partial
//! formatting), so matching is done on the coalesced text of each paragraph
//! (`a:p`) and the result is written back run by run. Run and paragraph
//! properties are never touched; only `a:t` text changes.
//!
//! A paragraph whose text holds a list token is replaced by one paragraph
//! per list item. Any other text of that paragraph, including scalar tokens,
//! is dropped with it. Every other paragraph gets its scalar tokens replaced
//! in one left-to-right pass, so inserted values are never searched again.

use crate::common::xml::{Element, Node, XmlDocument};
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::namespace::DML_MAIN;
use crate::ooxml::pptx::options::{BuildOptions, DEFAULT_LIST_INDENT_EMU};
use crate::ooxml::pptx::plan::{ItemType, ListItem, ReplacementValue, Replacements};
use crate::ooxml::pptx::structure::{PlaceholderKind, SlideTypeDescriptor};
use aho_corasick::{AhoCorasick, MatchKind};
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

/// Marker elements of `a:pPr`; exactly one of them may be present.
const MARKER_ELEMENTS: [&str; 4] = ["buNone", "buAutoNum", "buChar", "buBlip"];

/// `a:pPr` children that follow the marker in schema order.
const AFTER_MARKER: [&str; 3] = ["tabLst", "defRPr", "extLst"];

/// Values to substitute, split by how they render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    scalars: IndexMap<String, String>,
    lists: IndexMap<String, Vec<ListItem>>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a token to text. Empty tokens are ignored.
    pub fn insert_scalar(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        self.lists.shift_remove(&token);
        self.scalars.insert(token, value.into());
    }

    /// Bind a token to list items. Empty tokens are ignored.
    pub fn insert_list(&mut self, token: impl Into<String>, items: Vec<ListItem>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        self.scalars.shift_remove(&token);
        self.lists.insert(token, items);
    }

    /// Build from plan replacements.
    ///
    /// Tokens declared `list` always expand; text given for them becomes a
    /// one-item bullet list, or no items when empty. List values given for
    /// other tokens expand as given.
    pub fn from_replacements(replacements: &Replacements, descriptor: Option<&SlideTypeDescriptor>) -> Self {
        let mut map = Self::new();
        for (token, value) in replacements {
            let kind = descriptor.map(|d| d.kind_of(token)).unwrap_or_default();
            match (kind, value) {
                (PlaceholderKind::List, value) => map.insert_list(token.as_str(), value.clone().into_list()),
                (PlaceholderKind::Scalar, ReplacementValue::Text(text)) => {
                    map.insert_scalar(token.as_str(), text.as_str())
                },
                (PlaceholderKind::Scalar, ReplacementValue::List(items)) => {
                    map.insert_list(token.as_str(), items.clone())
                },
            }
        }
        map
    }

    #[inline]
    pub fn scalars(&self) -> &IndexMap<String, String> {
        &self.scalars
    }

    #[inline]
    pub fn lists(&self) -> &IndexMap<String, Vec<ListItem>> {
        &self.lists
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.lists.is_empty()
    }
}

/// How list items are marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStyle {
    pub bullet_char: String,
    pub numbering_scheme: String,
    /// Hanging indent of bullet and numbered items, in EMU
    pub indent_emu: i64,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self {
            bullet_char: "\u{2022}".to_string(),
            numbering_scheme: "arabicPeriod".to_string(),
            indent_emu: DEFAULT_LIST_INDENT_EMU,
        }
    }
}

impl From<&BuildOptions> for ListStyle {
    fn from(options: &BuildOptions) -> Self {
        Self {
            bullet_char: options.bullet_char.clone(),
            numbering_scheme: options.numbering_scheme.clone(),
            indent_emu: options.list_indent_emu,
        }
    }
}

/// What one resolution pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Occurrences replaced, per token
    pub substituted: IndexMap<String, usize>,
    /// Paragraphs replaced by list items
    pub expanded_paragraphs: usize,
    /// Paragraphs written for list items
    pub list_items: usize,
}

impl ResolveReport {
    /// Total occurrences replaced.
    pub fn total_substitutions(&self) -> usize {
        self.substituted.values().sum()
    }

    fn count(&mut self, token: &str) {
        *self.substituted.entry(token.to_string()).or_insert(0) += 1;
    }
}

/// Text span of one run inside its paragraph's coalesced text.
#[derive(Debug, Clone, Copy)]
struct RunSpan {
    /// Index of the `a:r` node among the paragraph's children
    child: usize,
    start: usize,
    end: usize,
}

/// Rewrites slide trees for one token map.
pub struct Resolver<'a> {
    tokens: &'a TokenMap,
    style: &'a ListStyle,
    scalar_tokens: Vec<&'a str>,
    scalar_matcher: Option<AhoCorasick>,
    list_tokens: Vec<&'a str>,
    list_matcher: Option<AhoCorasick>,
}

impl<'a> Resolver<'a> {
    pub fn new(tokens: &'a TokenMap, style: &'a ListStyle) -> Result<Self> {
        let scalar_tokens: Vec<&str> = tokens.scalars.keys().map(String::as_str).collect();
        let list_tokens: Vec<&str> = tokens.lists.keys().map(String::as_str).collect();
        Ok(Self {
            scalar_matcher: build_matcher(&scalar_tokens)?,
            list_matcher: build_matcher(&list_tokens)?,
            scalar_tokens,
            list_tokens,
            tokens,
            style,
        })
    }

    /// Resolve every paragraph of the document in place.
    pub fn resolve(&self, doc: &mut XmlDocument) -> ResolveReport {
        let mut report = ResolveReport::default();
        if !self.tokens.is_empty() {
            self.resolve_children(doc.root_mut(), &mut report);
        }
        report
    }

    fn resolve_children(&self, parent: &mut Element, report: &mut ResolveReport) {
        let children = std::mem::take(parent.children_mut());
        let mut out: Vec<Node> = Vec::with_capacity(children.len());
        // Where an emptied paragraph goes if every paragraph expands to nothing.
        let mut fallback: Option<(usize, Element)> = None;
        let mut had_paragraph = false;

        for node in children {
            match node {
                Node::Element(mut paragraph) if paragraph.is(DML_MAIN, "p") => {
                    had_paragraph = true;
                    match self.resolve_paragraph(&mut paragraph, report) {
                        Some(expanded) if expanded.is_empty() => {
                            if fallback.is_none() {
                                fallback = Some((out.len(), emptied(&paragraph)));
                            }
                        },
                        Some(expanded) => out.extend(expanded.into_iter().map(Node::Element)),
                        None => out.push(Node::Element(paragraph)),
                    }
                },
                Node::Element(mut child) => {
                    self.resolve_children(&mut child, report);
                    out.push(Node::Element(child));
                },
                other => out.push(other),
            }
        }

        let has_paragraph = out
            .iter()
            .any(|n| n.as_element().is_some_and(|el| el.is(DML_MAIN, "p")));
        if had_paragraph && !has_paragraph {
            if let Some((at, paragraph)) = fallback {
                out.insert(at.min(out.len()), Node::Element(paragraph));
            }
        }

        *parent.children_mut() = out;
    }

    /// Returns the replacement paragraphs when the paragraph holds a list
    /// token; otherwise rewrites scalar tokens in place and returns `None`.
    fn resolve_paragraph(&self, paragraph: &mut Element, report: &mut ResolveReport) -> Option<Vec<Element>> {
        let (text, spans) = coalesce(paragraph);
        if text.is_empty() {
            return None;
        }

        if let Some(matcher) = &self.list_matcher {
            if let Some(m) = matcher.find(text.as_str()) {
                let token = self.list_tokens[m.pattern().as_usize()];
                let span = spans.iter().find(|s| s.start <= m.start() && m.start() < s.end)?;
                let items = self.tokens.lists.get(token).map(Vec::as_slice).unwrap_or_default();
                report.count(token);
                report.expanded_paragraphs += 1;
                report.list_items += items.len();
                return Some(self.expand(paragraph, span.child, items));
            }
        }

        if let Some(matcher) = &self.scalar_matcher {
            self.replace_scalars(paragraph, matcher, &text, &spans, report);
        }
        None
    }

    fn replace_scalars(
        &self,
        paragraph: &mut Element,
        matcher: &AhoCorasick,
        text: &str,
        spans: &[RunSpan],
        report: &mut ResolveReport,
    ) {
        let mut outputs: Vec<String> = vec![String::new(); spans.len()];
        let mut pos = 0;
        let mut matched = false;

        for m in matcher.find_iter(text) {
            let token = self.scalar_tokens[m.pattern().as_usize()];
            let Some(owner) = spans.iter().position(|s| s.start <= m.start() && m.start() < s.end) else {
                continue;
            };
            copy_range(text, spans, pos, m.start(), &mut outputs);
            if let Some(value) = self.tokens.scalars.get(token) {
                outputs[owner].push_str(value);
            }
            pos = m.end();
            matched = true;
            report.count(token);
        }
        if !matched {
            return;
        }
        copy_range(text, spans, pos, text.len(), &mut outputs);

        let children = paragraph.children_mut();
        for (span, new_text) in spans.iter().zip(outputs) {
            if new_text == text[span.start..span.end] {
                continue;
            }
            if let Some(t) = children[span.child]
                .as_element_mut()
                .and_then(|run| run.child_mut(DML_MAIN, "t"))
            {
                t.set_text(&new_text);
            }
        }
    }

    fn expand(&self, paragraph: &Element, run_child: usize, items: &[ListItem]) -> Vec<Element> {
        let properties = paragraph.child(DML_MAIN, "pPr");
        let end_properties = paragraph.child(DML_MAIN, "endParaRPr");
        let Some(run) = paragraph.children().get(run_child).and_then(Node::as_element) else {
            return Vec::new();
        };

        items
            .iter()
            .map(|item| {
                let mut para = paragraph.shallow_clone();

                let mut ppr = properties
                    .cloned()
                    .unwrap_or_else(|| Element::new_like(paragraph, "pPr"));
                self.apply_marker(&mut ppr, item.item_type);
                para.push_element(ppr);

                let mut new_run = run.clone();
                if let Some(t) = new_run.child_mut(DML_MAIN, "t") {
                    t.set_text(&item.value);
                }
                para.push_element(new_run);

                if let Some(end) = end_properties {
                    para.push_element(end.clone());
                }
                para
            })
            .collect()
    }

    fn apply_marker(&self, ppr: &mut Element, item_type: ItemType) {
        ppr.children_mut().retain(|node| {
            !node
                .as_element()
                .is_some_and(|el| el.namespace() == Some(DML_MAIN) && MARKER_ELEMENTS.contains(&el.local_name()))
        });

        let marker = match item_type {
            ItemType::Bullet => {
                let mut el = Element::new_like(ppr, "buChar");
                el.set_attr("char", self.style.bullet_char.as_str());
                el
            },
            ItemType::Numbered => {
                let mut el = Element::new_like(ppr, "buAutoNum");
                el.set_attr("type", self.style.numbering_scheme.as_str());
                el
            },
            ItemType::Text => Element::new_like(ppr, "buNone"),
        };

        if item_type != ItemType::Text {
            if ppr.attr("marL").is_none() {
                ppr.set_attr("marL", self.style.indent_emu.to_string());
            }
            if ppr.attr("indent").is_none() {
                ppr.set_attr("indent", (-self.style.indent_emu).to_string());
            }
        }

        let children = ppr.children_mut();
        let at = children
            .iter()
            .position(|node| {
                node.as_element()
                    .is_some_and(|el| el.namespace() == Some(DML_MAIN) && AFTER_MARKER.contains(&el.local_name()))
            })
            .unwrap_or(children.len());
        children.insert(at, Node::Element(marker));
    }
}

fn build_matcher(tokens: &[&str]) -> Result<Option<AhoCorasick>> {
    if tokens.is_empty() {
        return Ok(None);
    }
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(tokens)
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("placeholder tokens: {e}")))
}

/// Coalesced run text of a paragraph and where each run sits in it.
fn coalesce(paragraph: &Element) -> (String, SmallVec<[RunSpan; 8]>) {
    let mut text = String::new();
    let mut spans = SmallVec::new();
    for (child, node) in paragraph.children().iter().enumerate() {
        let Some(run) = node.as_element().filter(|el| el.is(DML_MAIN, "r")) else {
            continue;
        };
        let Some(t) = run.child(DML_MAIN, "t") else {
            continue;
        };
        let start = text.len();
        text.push_str(&t.text());
        if text.len() > start {
            spans.push(RunSpan {
                child,
                start,
                end: text.len(),
            });
        }
    }
    (text, spans)
}

/// Append `text[from..to]` to the outputs of the runs it belongs to.
fn copy_range(text: &str, spans: &[RunSpan], from: usize, to: usize, outputs: &mut [String]) {
    if from >= to {
        return;
    }
    for (i, span) in spans.iter().enumerate() {
        let start = span.start.max(from);
        let end = span.end.min(to);
        if start < end {
            outputs[i].push_str(&text[start..end]);
        }
    }
}

/// A paragraph with its runs, fields and breaks removed; properties kept.
fn emptied(paragraph: &Element) -> Element {
    let mut para = paragraph.shallow_clone();
    for node in paragraph.children() {
        if let Node::Element(el) = node {
            if el.is(DML_MAIN, "pPr") || el.is(DML_MAIN, "endParaRPr") {
                para.push_element(el.clone());
            }
        }
    }
    para
}

/// Resolve a document in place.
pub fn resolve(doc: &mut XmlDocument, tokens: &TokenMap, style: &ListStyle) -> Result<ResolveReport> {
    Ok(Resolver::new(tokens, style)?.resolve(doc))
}

/// Parse a slide fragment and resolve it.
///
/// Fails with [`Error::ResolutionError`] only when the fragment is not
/// well-formed XML; tokens without a value stay as literal text.
pub fn resolve_fragment(
    bytes: &[u8],
    tokens: &TokenMap,
    style: &ListStyle,
) -> Result<(XmlDocument, ResolveReport)> {
    let mut doc = XmlDocument::parse(bytes).map_err(|e| Error::resolution("fragment", e))?;
    let report = resolve(&mut doc, tokens, style)?;
    Ok((doc, report))
}

/// `{{…}}` tokens visible in paragraph text, in first-seen order.
pub fn find_tokens(doc: &XmlDocument) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for paragraph in doc.root().descendants(DML_MAIN, "p") {
        let (text, _) = coalesce(paragraph);
        for token in scan_tokens(&text) {
            if !found.iter().any(|t| t == token) {
                found.push(token.to_string());
            }
        }
    }
    found
}

/// Occurrences of `{{` + one or more non-`}` characters + `}}`.
fn scan_tokens(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find("{{") {
        let start = i + offset;
        let inner = start + 2;
        let close = text[inner..].find('}').map_or(text.len(), |p| inner + p);
        if close > inner && bytes.get(close + 1) == Some(&b'}') {
            tokens.push(&text[start..close + 2]);
            i = close + 2;
        } else {
            i = start + 1;
        }
    }
    tokens
}
