// ── Selector grammar ──
//
// `<package>[.<section>[.<option>]]`, where `<section>` is either a
// section name or an `@type[index]` reference.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::package::{is_valid_name, is_valid_type};

/// How a selector addresses a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRef {
    /// `wireless.radio0`
    Named(String),
    /// `chilli.@chilli[0]`, `wireless.@wifi-iface[-1]`
    Indexed { section_type: String, index: i32 },
}

impl SectionRef {
    /// First section of a type, the common `@type[0]` form.
    pub fn first_of(section_type: impl Into<String>) -> Self {
        Self::Indexed {
            section_type: section_type.into(),
            index: 0,
        }
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Indexed {
                section_type,
                index,
            } => write!(f, "@{section_type}[{index}]"),
        }
    }
}

/// A parsed `package.section.option` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub package: String,
    pub section: Option<SectionRef>,
    pub option: Option<String>,
}

impl Selector {
    pub fn package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            section: None,
            option: None,
        }
    }

    pub fn section(mut self, section: SectionRef) -> Self {
        self.section = Some(section);
        self
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package)?;
        if let Some(ref section) = self.section {
            write!(f, ".{section}")?;
        }
        if let Some(ref option) = self.option {
            write!(f, ".{option}")?;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidSelector {
            selector: s.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parts = s.splitn(3, '.');
        let package = parts.next().unwrap_or_default();
        if !is_valid_type(package) {
            return Err(invalid("package name must match [A-Za-z0-9_-]+"));
        }

        let section = match parts.next() {
            Some(raw) => Some(parse_section_ref(raw).ok_or_else(|| {
                invalid("section must be a name or @type[index]")
            })?),
            None => None,
        };

        let option = match parts.next() {
            Some(raw) if is_valid_name(raw) => Some(raw.to_owned()),
            Some(_) => return Err(invalid("option name must match [A-Za-z0-9_]+")),
            None => None,
        };

        Ok(Self {
            package: package.to_owned(),
            section,
            option,
        })
    }
}

fn parse_section_ref(raw: &str) -> Option<SectionRef> {
    let Some(indexed) = raw.strip_prefix('@') else {
        return is_valid_name(raw).then(|| SectionRef::Named(raw.to_owned()));
    };

    let (section_type, rest) = indexed.split_once('[')?;
    let index = rest.strip_suffix(']')?.parse::<i32>().ok()?;
    is_valid_type(section_type).then(|| SectionRef::Indexed {
        section_type: section_type.to_owned(),
        index,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_option_path() {
        let sel: Selector = "wireless.radio0.channel".parse().unwrap();
        assert_eq!(sel.package, "wireless");
        assert_eq!(sel.section, Some(SectionRef::Named("radio0".into())));
        assert_eq!(sel.option.as_deref(), Some("channel"));
    }

    #[test]
    fn parses_indexed_section() {
        let sel: Selector = "chilli.@chilli[0].HS_RADIUS".parse().unwrap();
        assert_eq!(sel.section, Some(SectionRef::first_of("chilli")));
        assert_eq!(sel.to_string(), "chilli.@chilli[0].HS_RADIUS");

        let sel: Selector = "wireless.@wifi-iface[-1]".parse().unwrap();
        assert_eq!(
            sel.section,
            Some(SectionRef::Indexed {
                section_type: "wifi-iface".into(),
                index: -1
            })
        );
        assert!(sel.option.is_none());
    }

    #[test]
    fn bare_package_is_allowed() {
        let sel: Selector = "hotspot".parse().unwrap();
        assert_eq!(sel, Selector::package("hotspot"));
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "wireless.", "wireless.@wifi-iface", "wireless.@x[a]", "a.b.c.d", "a.b c"] {
            assert!(
                matches!(bad.parse::<Selector>(), Err(Error::InvalidSelector { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
