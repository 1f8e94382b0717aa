//! Free-function declarations at file scope (the RPC pass).
//!
//! Walks every line of a header tracking brace depth. A line that looks like
//! `<return> <name>(<params>` is recorded when the depth before it is zero, or
//! unconditionally for the RPC header, whose declarations may sit inside a
//! namespace. `///` lines accumulate and attach to the next recorded
//! declaration; any other line drops them.

use super::{brace_delta, code_part, doc_line};
use crate::model::RawSignature;
use regex::Regex;
use std::sync::LazyLock;

static RE_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(.*)\s+([^\(]*)\(([^\)]*)").unwrap());

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_:]*$").unwrap());

/// Leading specifiers that carry no type information.
const SPECIFIERS: &[&str] = &[
    "[[nodiscard]]",
    "inline",
    "static",
    "extern",
    "virtual",
    "explicit",
    "friend",
    "constexpr",
];

pub fn scan_rpc(input: &str, ignore_depth: bool) -> Vec<RawSignature> {
    let mut signatures = Vec::new();
    let mut docs: Vec<String> = Vec::new();
    let mut depth: i32 = 0;

    for raw in input.lines() {
        let line = raw.replace('*', "");
        let depth_before = depth;
        depth += brace_delta(&line);

        if let Some(doc) = doc_line(&line) {
            docs.push(doc);
            continue;
        }

        match parse_declaration(&line) {
            Some(sig) if ignore_depth || depth_before == 0 => signatures.push(RawSignature {
                return_type: strip_specifiers(&sig.return_type, false),
                docs: std::mem::take(&mut docs),
                ..sig
            }),
            _ => docs.clear(),
        }
    }

    signatures
}

/// `<return> <name>(<params>` on one line, comments and preprocessor lines
/// excluded. The return type keeps its specifiers.
pub(crate) fn parse_declaration(line: &str) -> Option<RawSignature> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") || trimmed.starts_with('#') {
        return None;
    }

    let caps = RE_DECLARATION.captures(code_part(line))?;
    let name = caps[2].trim();
    if !RE_NAME.is_match(name) {
        return None;
    }

    Some(RawSignature {
        return_type: caps[1].trim().to_string(),
        name: name.to_string(),
        params: caps[3].trim().to_string(),
        docs: Vec::new(),
    })
}

/// Remove leading specifiers, keeping `static` when `keep_static` is set.
pub(crate) fn strip_specifiers(text: &str, keep_static: bool) -> String {
    let mut rest = text.trim();
    let mut is_static = false;
    'outer: loop {
        for spec in SPECIFIERS {
            if let Some(after) = rest.strip_prefix(spec) {
                let boundary = after.is_empty() || after.starts_with(char::is_whitespace);
                if boundary || spec.ends_with(']') {
                    is_static |= *spec == "static";
                    rest = after.trim_start();
                    continue 'outer;
                }
            }
        }
        break;
    }
    if keep_static && is_static {
        format!("static {}", rest).trim_end().to_string()
    } else {
        rest.to_string()
    }
}
