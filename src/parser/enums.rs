//! `NAME = { ... }` blocks from the generated Lua enum file.
//!
//! A block runs from its header line to the first line that is exactly `}`.
//! Blocks whose first entry starts with `__` are internal and skipped.

use crate::model::EnumBlock;
use regex::Regex;
use std::sync::LazyLock;

static RE_ENUM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Z][A-Z0-9_]*)\s*=\s*\{[ \t]*\r?$").unwrap());

pub fn scan_enums(input: &str) -> Vec<EnumBlock> {
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(caps) = RE_ENUM_HEADER.captures_at(input, from) {
        let (Some(header), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let body_start = header.end();
        let Some(len) = input[body_start..].find("\n}") else {
            break;
        };
        let body = input[body_start..body_start + len].trim_start_matches(['\r', '\n']);
        from = body_start + len + 2;

        let internal = body
            .lines()
            .next()
            .is_some_and(|first| first.trim_start().starts_with("__"));
        if internal {
            continue;
        }

        blocks.push(EnumBlock {
            name: name.as_str().to_string(),
            body: body.trim_end().to_string(),
        });
    }

    blocks
}
