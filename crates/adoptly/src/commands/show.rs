//! Show handler: read back packages in `uci show` notation.

use std::collections::HashMap;

use serde::Serialize;
use tabled::Tabled;

use adoptly_uci::format::quote;
use adoptly_uci::{ConfigStore, FileStore, OptionValue, Package, Section, Selector};

use crate::cli::{GlobalOpts, ShowArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

// ── Entries ─────────────────────────────────────────────────────────

/// One `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
struct Entry {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn format_value(value: &OptionValue) -> String {
    value.values().iter().map(|v| quote(v)).collect::<Vec<_>>().join(" ")
}

/// Section labels as `uci show` prints them: the name, or `@type[index]`
/// for anonymous sections.
fn labelled(pkg: &Package) -> Vec<(String, &Section)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    pkg.sections()
        .iter()
        .map(|section| {
            let index = seen.entry(section.section_type()).or_default();
            let label = if section.is_anonymous() {
                format!("@{}[{index}]", section.section_type())
            } else {
                section.name().to_owned()
            };
            *index += 1;
            (label, section)
        })
        .collect()
}

fn section_entries(pkg: &Package, label: &str, section: &Section) -> Vec<Entry> {
    let prefix = format!("{}.{label}", pkg.name());
    let mut entries = vec![Entry {
        key: prefix.clone(),
        value: section.section_type().to_owned(),
    }];
    entries.extend(section.options().map(|(name, value)| Entry {
        key: format!("{prefix}.{name}"),
        value: format_value(value),
    }));
    entries
}

/// Entries addressed by `selector` within `pkg`.
fn select(pkg: &Package, selector: &Selector) -> Result<Vec<Entry>, CliError> {
    let not_found = || CliError::SelectorNotFound {
        selector: selector.to_string(),
        package: pkg.name().to_owned(),
    };
    let labelled = labelled(pkg);

    let Some(ref section_ref) = selector.section else {
        return Ok(labelled
            .iter()
            .flat_map(|(label, section)| section_entries(pkg, label, section))
            .collect());
    };

    let target = pkg.resolve(section_ref).ok_or_else(not_found)?;
    let (label, section) = labelled
        .iter()
        .find(|(_, s)| std::ptr::eq(*s, target))
        .ok_or_else(not_found)?;

    match selector.option {
        None => Ok(section_entries(pkg, label, section)),
        Some(ref option) => {
            let value = section.option(option).ok_or_else(not_found)?;
            Ok(vec![Entry {
                key: format!("{}.{label}.{option}", pkg.name()),
                value: format_value(value),
            }])
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ShowArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let selector: Selector = args.selector.parse()?;
    let store = FileStore::new(&cfg.store.config_dir);
    let pkg = store.load(&selector.package)?;
    let entries = select(&pkg, &selector)?;

    let out = output::render_list(
        &global.output,
        &entries,
        Clone::clone,
        |e| format!("{}={}", e.key, e.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CHILLI: &str = "\
config chilli
\toption HS_RADIUS '10.0.0.1'

config chilli
\toption HS_RADIUS '10.0.0.2'

config settings 'main'
\tlist dns '1.1.1.1'
\tlist dns '8.8.8.8'
";

    fn pkg() -> Package {
        adoptly_uci::format::parse("chilli", CHILLI).unwrap()
    }

    fn keys(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| format!("{}={}", e.key, e.value)).collect()
    }

    #[test]
    fn whole_package_uses_indexed_labels() {
        let entries = select(&pkg(), &"chilli".parse().unwrap()).unwrap();
        assert_eq!(
            keys(&entries),
            vec![
                "chilli.@chilli[0]=chilli",
                "chilli.@chilli[0].HS_RADIUS='10.0.0.1'",
                "chilli.@chilli[1]=chilli",
                "chilli.@chilli[1].HS_RADIUS='10.0.0.2'",
                "chilli.main=settings",
                "chilli.main.dns='1.1.1.1' '8.8.8.8'",
            ]
        );
    }

    #[test]
    fn negative_index_selects_last() {
        let entries = select(&pkg(), &"chilli.@chilli[-1].HS_RADIUS".parse().unwrap()).unwrap();
        assert_eq!(keys(&entries), vec!["chilli.@chilli[1].HS_RADIUS='10.0.0.2'"]);
    }

    #[test]
    fn missing_option_is_not_found() {
        let err = select(&pkg(), &"chilli.main.HS_PORT".parse().unwrap()).unwrap_err();
        assert!(matches!(err, CliError::SelectorNotFound { .. }));
    }
}
