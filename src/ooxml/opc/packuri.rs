/// Part names within an OPC package.
///
/// Archive entries are addressed by their ZIP member name (no leading slash,
/// e.g. `ppt/slides/slide1.xml`). Relationship targets and content-type
/// overrides use the slash-prefixed form (`/ppt/slides/slide1.xml`) or a
/// reference relative to the source part's directory. [`PartName`] converts
/// between these forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct PartName {
    /// Member name, without leading slash
    member: String,
}

impl PartName {
    /// Create a part name from either form; a leading slash is dropped.
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let name = name.as_ref();
        PartName {
            member: normalize_path(name.trim_start_matches('/')),
        }
    }

    /// Resolve a relationship target against the directory of its source part.
    ///
    /// Absolute targets (leading slash) are taken from the package root.
    ///
    /// ```
    /// use longan::ooxml::opc::PartName;
    /// let layout = PartName::resolve("ppt/slides", "../slideLayouts/slideLayout1.xml");
    /// assert_eq!(layout.member(), "ppt/slideLayouts/slideLayout1.xml");
    /// ```
    pub fn resolve(base_dir: &str, target: &str) -> Self {
        if target.starts_with('/') || base_dir.is_empty() {
            return Self::new(target);
        }
        Self::new(format!("{base_dir}/{target}"))
    }

    /// Member name, as stored in the ZIP container.
    #[inline]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Slash-prefixed form used by content-type overrides.
    #[inline]
    pub fn uri(&self) -> String {
        format!("/{}", self.member)
    }

    /// Directory portion, e.g. `ppt/slides`; empty for parts at the root.
    pub fn dir(&self) -> &str {
        match self.member.rfind('/') {
            Some(pos) => &self.member[..pos],
            None => "",
        }
    }

    /// File name portion, e.g. `slide1.xml`.
    pub fn filename(&self) -> &str {
        match self.member.rfind('/') {
            Some(pos) => &self.member[pos + 1..],
            None => &self.member,
        }
    }

    /// Extension without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Numeric suffix of a tuple part name (21 for `slide21.xml`), if any.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        stem[stem.len() - digits..].parse().ok()
    }

    /// Member name of the relationship part belonging to this part.
    ///
    /// ```
    /// use longan::ooxml::opc::PartName;
    /// let slide = PartName::new("ppt/slides/slide1.xml");
    /// assert_eq!(slide.rels_member(), "ppt/slides/_rels/slide1.xml.rels");
    /// ```
    pub fn rels_member(&self) -> String {
        match self.dir() {
            "" => format!("_rels/{}.rels", self.filename()),
            dir => format!("{dir}/_rels/{}.rels", self.filename()),
        }
    }

    /// Inverse of [`PartName::rels_member`]: the part a relationship part describes.
    pub fn source_of_rels(rels_member: &str) -> Option<Self> {
        let rels = Self::new(rels_member);
        let source_file = rels.filename().strip_suffix(".rels")?;
        let rels_dir = rels.dir();
        let source_dir = if rels_dir == "_rels" {
            ""
        } else {
            rels_dir.strip_suffix("/_rels")?
        };
        if source_dir.is_empty() {
            Some(Self::new(source_file))
        } else {
            Some(Self::new(format!("{source_dir}/{source_file}")))
        }
    }

    /// Reference to this part relative to `base_dir`.
    ///
    /// ```
    /// use longan::ooxml::opc::PartName;
    /// let layout = PartName::new("ppt/slideLayouts/slideLayout2.xml");
    /// assert_eq!(layout.relative_to("ppt/slides"), "../slideLayouts/slideLayout2.xml");
    /// assert_eq!(layout.relative_to("ppt"), "slideLayouts/slideLayout2.xml");
    /// ```
    pub fn relative_to(&self, base_dir: &str) -> String {
        let from: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.member.split('/').filter(|s| !s.is_empty()).collect();

        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::with_capacity(from.len() - common + to.len() - common);
        parts.extend(std::iter::repeat_n("..", from.len() - common));
        parts.extend(&to[common..]);
        parts.join("/")
    }
}

impl std::fmt::Display for PartName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.member)
    }
}

impl AsRef<str> for PartName {
    fn as_ref(&self) -> &str {
        &self.member
    }
}

/// Resolve `.` and `..` segments; `..` never climbs above the package root.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

/// Member name of the content-type registry
pub const CONTENT_TYPES_MEMBER: &str = "[Content_Types].xml";

/// Member name of the package-level relationship part
pub const PACKAGE_RELS_MEMBER: &str = "_rels/.rels";
