//! In-memory OPC package.
//!
//! An [`Archive`] holds every member of a presentation package in template
//! order. Manifests are parsed when the package is opened; other parts stay as
//! bytes until a caller asks for their XML. Nothing here touches the
//! filesystem: packages come in and go out as byte buffers.

use crate::common::xml::XmlDocument;
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_MEMBER, PACKAGE_RELS_MEMBER, PartName};
use crate::ooxml::opc::rel::Relationships;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Presentation part used when the package relationships do not name one.
pub const DEFAULT_PRESENTATION_MEMBER: &str = "ppt/presentation.xml";

/// One archive member.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Raw payload: media, fonts, parts nobody has parsed yet
    Binary(Vec<u8>),
    /// Parsed XML part
    Xml(XmlDocument),
}

impl Entry {
    /// Serialized bytes of this entry.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Entry::Binary(bytes) => bytes.clone(),
            Entry::Xml(doc) => doc.to_bytes(),
        }
    }
}

/// ZIP compression applied to every member on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// An opened presentation package.
#[derive(Debug, Clone)]
pub struct Archive {
    entries: IndexMap<String, Entry>,
    /// Main presentation part, found through the package relationships
    presentation: PartName,
}

impl Archive {
    /// Open a package from bytes.
    ///
    /// Fails with [`Error::CorruptArchive`] when the bytes are not a ZIP
    /// container, or when `[Content_Types].xml`, the presentation part or the
    /// presentation's relationship part is missing or not well-formed.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::CorruptArchive(format!("not a ZIP container: {e}")))?;

        let mut entries = IndexMap::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| Error::CorruptArchive(format!("unreadable member #{i}: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::CorruptArchive(format!("cannot read {name}: {e}")))?;
            entries.insert(name, Entry::Binary(data));
        }

        let mut archive = Self {
            entries,
            presentation: PartName::new(DEFAULT_PRESENTATION_MEMBER),
        };
        archive.load_manifests()?;

        tracing::debug!(
            entries = archive.len(),
            presentation = %archive.presentation,
            "opened package"
        );
        Ok(archive)
    }

    fn load_manifests(&mut self) -> Result<()> {
        self.parse_required(CONTENT_TYPES_MEMBER)?;

        if self.contains(PACKAGE_RELS_MEMBER) {
            let doc = self.parse_required(PACKAGE_RELS_MEMBER)?;
            let rels = Relationships::from_document(doc, "");
            if let Some(part) = rels
                .first_of_type(rt::OFFICE_DOCUMENT)
                .and_then(|rel| rel.target_part(""))
            {
                self.presentation = part;
            }
        }

        let presentation = self.presentation.member().to_string();
        let presentation_rels = self.presentation.rels_member();
        self.parse_required(&presentation)?;
        self.parse_required(&presentation_rels)?;
        Ok(())
    }

    /// Parse a required member in place.
    fn parse_required(&mut self, path: &str) -> Result<&XmlDocument> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| Error::CorruptArchive(format!("missing required part {path}")))?;
        if let Entry::Binary(bytes) = entry {
            let doc = XmlDocument::parse(bytes)
                .map_err(|e| Error::CorruptArchive(format!("{path} is not well-formed: {e}")))?;
            *entry = Entry::Xml(doc);
        }
        match entry {
            Entry::Xml(doc) => Ok(doc),
            Entry::Binary(_) => Err(Error::CorruptArchive(format!("{path} could not be parsed"))),
        }
    }

    /// The main presentation part.
    #[inline]
    pub fn presentation_part(&self) -> &PartName {
        &self.presentation
    }

    /// Get an entry.
    #[inline]
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Get an entry mutably.
    #[inline]
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Entry> {
        self.entries.get_mut(path)
    }

    /// Insert or overwrite an entry. New paths go after existing ones.
    pub fn put(&mut self, path: impl Into<String>, entry: Entry) {
        self.entries.insert(path.into(), entry);
    }

    /// Insert or overwrite a parsed XML part.
    #[inline]
    pub fn put_xml(&mut self, path: impl Into<String>, doc: XmlDocument) {
        self.put(path, Entry::Xml(doc));
    }

    /// Remove an entry, keeping the order of the others.
    #[inline]
    pub fn remove(&mut self, path: &str) -> Option<Entry> {
        self.entries.shift_remove(path)
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Member names in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a part into a tree without changing the archive.
    ///
    /// A missing part is [`Error::CorruptArchive`]; a part that is not
    /// well-formed is [`Error::ResolutionError`].
    pub fn xml(&self, path: &str) -> Result<XmlDocument> {
        match self.entries.get(path) {
            Some(Entry::Xml(doc)) => Ok(doc.clone()),
            Some(Entry::Binary(bytes)) => {
                XmlDocument::parse(bytes).map_err(|e| Error::resolution(path, e))
            },
            None => Err(Error::CorruptArchive(format!("missing part {path}"))),
        }
    }

    /// Parse a part in place and borrow the tree mutably.
    pub fn xml_mut(&mut self, path: &str) -> Result<&mut XmlDocument> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| Error::CorruptArchive(format!("missing part {path}")))?;
        if let Entry::Binary(bytes) = entry {
            let doc = XmlDocument::parse(bytes).map_err(|e| Error::resolution(path, e))?;
            *entry = Entry::Xml(doc);
        }
        match entry {
            Entry::Xml(doc) => Ok(doc),
            Entry::Binary(_) => Err(Error::resolution(path, "part could not be parsed")),
        }
    }

    /// Relationships of a part, or an empty set if it has no `.rels` part.
    pub fn relationships(&self, part: &PartName) -> Result<Relationships> {
        let rels_member = part.rels_member();
        if !self.contains(&rels_member) {
            return Ok(Relationships::new(part.dir()));
        }
        let doc = self.xml(&rels_member)?;
        Ok(Relationships::from_document(&doc, part.dir()))
    }

    /// Directory holding slide parts, e.g. `ppt/slides`.
    pub fn slides_dir(&self) -> String {
        match self.presentation.dir() {
            "" => "slides".to_string(),
            dir => format!("{dir}/slides"),
        }
    }

    /// Slide number of a member if it is a slide part (`slides/slideN.xml`).
    pub fn slide_number(&self, path: &str) -> Option<u32> {
        let part = PartName::new(path);
        if part.dir() != self.slides_dir() || part.ext() != "xml" || !part.filename().starts_with("slide") {
            return None;
        }
        part.idx()
    }

    /// Member order used on output.
    ///
    /// Manifests first, then slides by number each followed by its
    /// relationship part, then every other member in archive order.
    pub fn serialization_order(&self) -> Vec<&str> {
        let presentation_rels = self.presentation.rels_member();
        let manifests = [
            CONTENT_TYPES_MEMBER,
            PACKAGE_RELS_MEMBER,
            self.presentation.member(),
            presentation_rels.as_str(),
        ];

        let mut order: Vec<&str> = Vec::with_capacity(self.entries.len());
        for manifest in manifests {
            if let Some((path, _)) = self.entries.get_key_value(manifest) {
                order.push(path.as_str());
            }
        }

        let mut slides: Vec<(u32, &str)> = self
            .paths()
            .filter_map(|path| self.slide_number(path).map(|n| (n, path)))
            .collect();
        slides.sort_unstable();
        for (_, slide) in slides {
            order.push(slide);
            let rels = PartName::new(slide).rels_member();
            if let Some((path, _)) = self.entries.get_key_value(rels.as_str()) {
                order.push(path.as_str());
            }
        }

        let placed: std::collections::HashSet<&str> = order.iter().copied().collect();
        let rest: Vec<&str> = self.paths().filter(|path| !placed.contains(path)).collect();
        order.extend(rest);
        order
    }

    /// Write the package to bytes.
    pub fn serialize(&self, compression: Compression) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(compression.method());

        for path in self.serialization_order() {
            let Some(entry) = self.entries.get(path) else {
                continue;
            };
            writer.start_file(path, options)?;
            match entry {
                Entry::Binary(bytes) => writer.write_all(bytes)?,
                Entry::Xml(doc) => writer.write_all(&doc.to_bytes())?,
            }
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
