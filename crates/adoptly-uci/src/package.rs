// ── Package snapshot ──
//
// In-memory copy of one configuration package. Every section and option
// mutation is staged here; nothing reaches disk until the owning store
// commits the snapshot.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Error;
use crate::selector::SectionRef;

// ── OptionValue ─────────────────────────────────────────────────────

/// Value of a single option: `option` lines hold one string, `list`
/// lines accumulate several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Single(String),
    List(Vec<String>),
}

impl OptionValue {
    /// The scalar value, or `None` for lists.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::List(_) => None,
        }
    }

    /// All values, a scalar being a one-element slice.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::List(items) => items,
        }
    }
}

// ── Section ─────────────────────────────────────────────────────────

/// A typed group of options, e.g. `config wifi-iface 'guest5'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    name: String,
    #[serde(rename = "type")]
    section_type: String,
    anonymous: bool,
    options: IndexMap<String, OptionValue>,
}

impl Section {
    fn new(section_type: &str, name: String, anonymous: bool) -> Self {
        Self {
            name,
            section_type: section_type.to_owned(),
            anonymous,
            options: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section_type(&self) -> &str {
        &self.section_type
    }

    /// Anonymous sections carry a generated name that is never written back.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Shorthand for the scalar value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(OptionValue::as_str)
    }
}

// ── Package ─────────────────────────────────────────────────────────

/// One configuration package (a file under `/etc/config`), held in memory.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    name: String,
    sections: Vec<Section>,
    #[serde(skip)]
    anonymous_seq: u32,
}

// Equality is about content; the anonymous-name counter is bookkeeping.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sections == other.sections
    }
}

impl Eq for Package {}

impl Package {
    /// An empty package. Name validation happens at the store boundary.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            anonymous_seq: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn sections_of_type<'a, 't>(
        &'a self,
        section_type: &'t str,
    ) -> impl Iterator<Item = &'a Section> + use<'a, 't> {
        self.sections
            .iter()
            .filter(move |s| s.section_type == section_type)
    }

    /// Look up a section by name or by `@type[index]` reference.
    ///
    /// Negative indices count from the end, as `uci` does.
    pub fn resolve(&self, section: &SectionRef) -> Option<&Section> {
        match section {
            SectionRef::Named(name) => self.section(name),
            SectionRef::Indexed {
                section_type,
                index,
            } => {
                let matching: Vec<&Section> = self
                    .sections
                    .iter()
                    .filter(|s| s.section_type == *section_type)
                    .collect();
                let idx = if *index < 0 {
                    matching.len().checked_sub(index.unsigned_abs() as usize)?
                } else {
                    usize::try_from(*index).ok()?
                };
                matching.get(idx).copied()
            }
        }
    }

    pub fn option(&self, section: &str, option: &str) -> Option<&OptionValue> {
        self.section(section).and_then(|s| s.option(option))
    }

    // ── Staged mutations ─────────────────────────────────────────────

    /// Stage a new named section. Creation is never idempotent: an
    /// existing section with the same name is an error.
    pub fn new_section(&mut self, section_type: &str, name: &str) -> Result<&Section, Error> {
        validate_type(section_type)?;
        validate_name("section", name)?;
        if self.contains_section(name) {
            return Err(Error::DuplicateSection {
                package: self.name.clone(),
                section: name.to_owned(),
            });
        }
        Ok(self.push_section(Section::new(section_type, name.to_owned(), false)))
    }

    /// Stage a new anonymous section with a generated `cfgNNNNNN` name.
    pub fn new_anonymous_section(&mut self, section_type: &str) -> Result<&Section, Error> {
        validate_type(section_type)?;
        let name = self.next_anonymous_name(section_type);
        Ok(self.push_section(Section::new(section_type, name, true)))
    }

    /// Stage a scalar option write, replacing any previous value.
    pub fn set_option(&mut self, section: &str, option: &str, value: &str) -> Result<(), Error> {
        validate_name("option", option)?;
        let target = self.section_mut(section)?;
        target
            .options
            .insert(option.to_owned(), OptionValue::Single(value.to_owned()));
        Ok(())
    }

    /// Append to a list option, turning a scalar into a list if needed.
    pub(crate) fn push_list(
        &mut self,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), Error> {
        validate_name("option", option)?;
        let target = self.section_mut(section)?;
        let entry = target
            .options
            .entry(option.to_owned())
            .or_insert_with(|| OptionValue::List(Vec::new()));
        match entry {
            OptionValue::List(items) => items.push(value.to_owned()),
            OptionValue::Single(prev) => {
                let prev = std::mem::take(prev);
                *entry = OptionValue::List(vec![prev, value.to_owned()]);
            }
        }
        Ok(())
    }

    /// Stage removal of one section.
    pub fn delete_section(&mut self, name: &str) -> Result<Section, Error> {
        let pos = self
            .sections
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| self.section_not_found(name))?;
        Ok(self.sections.remove(pos))
    }

    /// Stage removal of every section of the given type. Returns the count.
    pub fn delete_sections_of_type(&mut self, section_type: &str) -> usize {
        let before = self.sections.len();
        self.sections.retain(|s| s.section_type != section_type);
        before - self.sections.len()
    }

    /// Stage removal of every section. Returns the count.
    pub fn clear(&mut self) -> usize {
        let removed = self.sections.len();
        self.sections.clear();
        removed
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn push_section(&mut self, section: Section) -> &Section {
        self.sections.push(section);
        let last = self.sections.len() - 1;
        &self.sections[last]
    }

    fn section_mut(&mut self, name: &str) -> Result<&mut Section, Error> {
        let package = &self.name;
        self.sections
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SectionNotFound {
                package: package.clone(),
                section: name.to_owned(),
            })
    }

    fn section_not_found(&self, name: &str) -> Error {
        Error::SectionNotFound {
            package: self.name.clone(),
            section: name.to_owned(),
        }
    }

    /// Mirrors libuci's `cfgXXYYYY`: XX is a sequence number, YYYY a
    /// checksum of the section type. Past 0xff the sequence widens.
    fn next_anonymous_name(&mut self, section_type: &str) -> String {
        loop {
            let name = format!(
                "cfg{:02x}{:04x}",
                self.anonymous_seq,
                type_checksum(section_type)
            );
            self.anonymous_seq += 1;
            if !self.contains_section(&name) {
                return name;
            }
        }
    }
}

// ── Name validation ─────────────────────────────────────────────────

/// Section and option names: `[A-Za-z0-9_]+`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Package and section type names additionally allow `-`.
pub fn is_valid_type(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<(), Error> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind,
            name: name.to_owned(),
        })
    }
}

pub(crate) fn validate_type(section_type: &str) -> Result<(), Error> {
    if is_valid_type(section_type) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "section type",
            name: section_type.to_owned(),
        })
    }
}

/// FNV-1a folded to 16 bits.
fn type_checksum(section_type: &str) -> u32 {
    let hash = section_type
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    (hash >> 16) ^ (hash & 0xffff)
}
