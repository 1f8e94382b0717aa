//! Usertype registrations, scanned over whitespace-free text so that calls
//! spanning many lines read as one.

use crate::model::{Attribute, Usertype};
use crate::translate::split_top_level;
use regex::Regex;
use std::sync::LazyLock;

static RE_NEW_USERTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"new_usertype<([^>]*?)>\("([^"]*)""#).unwrap());

static RE_BASES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"bases<([^>]*)>").unwrap());

static RE_OPEN_LIBRARIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"open_libraries\(([^)]*)\)").unwrap());

/// Drop every whitespace character.
pub fn flatten(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Every `new_usertype<Native>("Name", attrs...)` call in flattened text.
pub fn scan_usertypes(flat: &str) -> Vec<Usertype> {
    let mut usertypes = Vec::new();
    for caps in RE_NEW_USERTYPE.captures_iter(flat) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        // `("` sits right before the name
        let Some(close) = matching_paren(flat, name.start() - 2) else {
            continue;
        };
        let rest = &flat[whole.end()..close];
        let list = rest.strip_prefix(',').unwrap_or(rest);
        let (bases, attributes) = parse_attributes(list);

        usertypes.push(Usertype {
            native_class: caps[1].to_string(),
            script_name: caps[2].to_string(),
            bases,
            attributes,
            docs: Vec::new(),
        });
    }
    usertypes
}

/// Library names passed to `open_libraries(...)`, without `sol::lib::`.
pub fn scan_libraries(flat: &str) -> Vec<String> {
    RE_OPEN_LIBRARIES
        .captures_iter(flat)
        .flat_map(|caps| {
            caps[1]
                .split(',')
                .map(|lib| lib.trim_start_matches("sol::lib::").to_string())
                .filter(|lib| !lib.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Split an attribute list into base classes and attribute entries.
///
/// A quoted string is a member name and takes the next entry as its
/// expression. Unquoted keys (`sol::base_classes`, `sol::meta_function::*`,
/// `sol::call_constructor`) take their value too; only `bases<...>` and
/// `constructors<...>` values are kept from those.
pub fn parse_attributes(list: &str) -> (Vec<String>, Vec<Attribute>) {
    let mut bases = Vec::new();
    let mut attributes = Vec::new();
    let mut entries = split_top_level(list, ',')
        .into_iter()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    while let Some(entry) = entries.next() {
        if let Some(name) = quoted(entry) {
            if let Some(expr) = entries.next() {
                attributes.push(Attribute::Member {
                    name: name.to_string(),
                    expr: expr.to_string(),
                });
            }
            continue;
        }
        if classify(entry, &mut bases, &mut attributes) || entry.ends_with("no_constructor") {
            continue;
        }
        if let Some(value) = entries.next() {
            classify(value, &mut bases, &mut attributes);
        }
    }

    (bases, attributes)
}

fn classify(entry: &str, bases: &mut Vec<String>, attributes: &mut Vec<Attribute>) -> bool {
    if entry.contains("constructors<") {
        attributes.push(Attribute::Constructors);
        return true;
    }
    if let Some(caps) = RE_BASES.captures(entry) {
        *bases = caps[1]
            .split(',')
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        return true;
    }
    false
}

fn quoted(entry: &str) -> Option<&str> {
    entry.strip_prefix('"')?.strip_suffix('"')
}

/// Byte index of the `)` closing the `(` at `open`, skipping string literals.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
