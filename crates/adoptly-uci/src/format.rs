// ── UCI text format ──
//
// Reads and writes the line-oriented `/etc/config/<package>` syntax:
//
//   config wifi-iface 'guest5'
//           option ssid 'Guest5GHz'
//           list maclist '00:11:22:33:44:55'
//
// Rendering follows the layout `uci export` produces so committed files
// look exactly like ones written by the native tools.

use std::fmt::Write as _;

use crate::error::Error;
use crate::package::{OptionValue, Package};

/// Parse the contents of a package file.
pub fn parse(package: &str, input: &str) -> Result<Package, Error> {
    let mut pkg = Package::new(package);
    let mut current: Option<String> = None;

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let parse_err = |message: String| Error::Parse {
            package: package.to_owned(),
            line: line_no,
            message,
        };

        let tokens = tokenize(line).map_err(parse_err)?;
        let Some((keyword, args)) = tokens.split_first() else {
            continue;
        };

        match (keyword.as_str(), args) {
            ("package", [_name]) => {}
            ("config", [section_type]) => {
                let section = pkg
                    .new_anonymous_section(section_type)
                    .map_err(|e| parse_err(e.to_string()))?;
                current = Some(section.name().to_owned());
            }
            ("config", [section_type, name]) => {
                // A repeated named section extends the earlier one.
                if !pkg.contains_section(name) {
                    pkg.new_section(section_type, name)
                        .map_err(|e| parse_err(e.to_string()))?;
                }
                current = Some(name.clone());
            }
            ("option" | "list", [name, value]) => {
                let section = current
                    .as_deref()
                    .ok_or_else(|| parse_err(format!("'{keyword}' outside of a config section")))?;
                let staged = if keyword == "option" {
                    pkg.set_option(section, name, value)
                } else {
                    pkg.push_list(section, name, value)
                };
                staged.map_err(|e| parse_err(e.to_string()))?;
            }
            ("package" | "config" | "option" | "list", _) => {
                return Err(parse_err(format!(
                    "wrong number of arguments for '{keyword}'"
                )));
            }
            (other, _) => return Err(parse_err(format!("unknown keyword '{other}'"))),
        }
    }

    Ok(pkg)
}

/// Render a package in `uci export` layout.
pub fn render(pkg: &Package) -> String {
    let mut out = String::new();
    for section in pkg.sections() {
        let _ = write!(out, "\nconfig {}", section.section_type());
        if !section.is_anonymous() {
            let _ = write!(out, " {}", quote(section.name()));
        }
        out.push('\n');

        for (name, value) in section.options() {
            match value {
                OptionValue::Single(v) => {
                    let _ = writeln!(out, "\toption {name} {}", quote(v));
                }
                OptionValue::List(items) => {
                    for item in items {
                        let _ = writeln!(out, "\tlist {name} {}", quote(item));
                    }
                }
            }
        }
    }
    out
}

/// Single-quote a value; embedded quotes become `'\''`.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

// ── Tokenizer ───────────────────────────────────────────────────────

/// Split one line into shell-like words.
///
/// Handles single quotes (literal), double quotes (backslash escapes),
/// bare backslash escapes, adjacent concatenation and `#` comments.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.peek() {
            None | Some('#') => break,
            Some(_) => {}
        }

        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '\'' => loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => token.push(ch),
                        None => return Err("unterminated single quote".into()),
                    }
                },
                '"' => loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch) => token.push(ch),
                            None => return Err("unterminated double quote".into()),
                        },
                        Some(ch) => token.push(ch),
                        None => return Err("unterminated double quote".into()),
                    }
                },
                '\\' => match chars.next() {
                    Some(ch) => token.push(ch),
                    None => return Err("dangling backslash".into()),
                },
                other => token.push(other),
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const WIRELESS: &str = "
config wifi-device 'radio0'
\toption type 'mac80211'
\toption channel '11'
\tlist ht_capab 'SHORT-GI-20'
\tlist ht_capab 'SHORT-GI-40'

config wifi-iface 'default_radio0'
\toption device 'radio0'
\toption ssid 'OpenWrt'
";

    #[test]
    fn tokenizer_handles_quoting_styles() {
        assert_eq!(
            tokenize(r#"option ssid "Cafe \"Bar\"" # trailing"#).unwrap(),
            ["option", "ssid", "Cafe \"Bar\""]
        );
        assert_eq!(
            tokenize(r"option key 'it'\''s'").unwrap(),
            ["option", "key", "it's"]
        );
        assert_eq!(tokenize("option empty ''").unwrap(), ["option", "empty", ""]);
        assert!(tokenize("   # just a comment").unwrap().is_empty());
        assert!(tokenize("option key 'open").is_err());
    }

    #[test]
    fn parse_then_render_is_stable() {
        let pkg = parse("wireless", WIRELESS).unwrap();
        assert_eq!(pkg.len(), 2);
        assert_eq!(
            pkg.option("radio0", "ht_capab").unwrap().values(),
            ["SHORT-GI-20", "SHORT-GI-40"]
        );
        assert_eq!(render(&pkg), WIRELESS);
    }

    #[test]
    fn anonymous_sections_render_without_name() {
        let input = "config chilli\n\toption HS_LANIF 'br-lan'\n";
        let pkg = parse("chilli", input).unwrap();
        let section = &pkg.sections()[0];
        assert!(section.is_anonymous());
        assert_eq!(render(&pkg), format!("\n{input}"));
    }

    #[test]
    fn parses_more_anonymous_sections_than_two_hex_digits_name() {
        let input = "config chilli\n".repeat(257);
        let pkg = parse("chilli", &input).unwrap();
        assert_eq!(pkg.len(), 257);
        assert!(pkg.sections().iter().all(|s| s.is_anonymous()));
    }

    #[test]
    fn repeated_named_section_is_merged() {
        let input = "config x 'a'\n option one 1\nconfig x 'a'\n option two 2\n";
        let pkg = parse("test", input).unwrap();
        assert_eq!(pkg.len(), 1);
        assert_eq!(pkg.section("a").unwrap().get("two"), Some("2"));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = parse("test", "config x 'a'\noption\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");

        let err = parse("test", "option one 1\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }), "{err}");

        let err = parse("test", "\n\nbogus line\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote("it's"), r"'it'\''s'");
    }
}
