//! Binding-source line scanner: `lua["name"] = expr;` registrations, bare
//! `lua["name"];` event slots, `Entity.as_*` casts and the docs that
//! precede `new_usertype<...>` calls.
//!
//! The script-table identifier (`lua` by default) is configurable.

use super::{code_part, doc_line};
use crate::model::{EventName, FunctionBinding};
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;

static RE_USERTYPE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"new_usertype\s*<\s*([^>]*?)\s*>").unwrap());

/// Patterns compiled against one script-table name.
#[derive(Debug)]
pub struct BindingPatterns {
    assignment: Regex,
    event: Regex,
    cast: Regex,
}

impl BindingPatterns {
    pub fn new(table: &str) -> Result<Self> {
        let t = regex::escape(table);
        let key = r#"\[\s*['"]([^'"]*)['"]\s*\]"#;
        let compile = |pattern: String| {
            Regex::new(&pattern)
                .with_context(|| format!("invalid script table name: {}", table))
        };
        Ok(Self {
            assignment: compile(format!(r"\b{t}{key}\s*=\s*([^=].*)$"))?,
            event: compile(format!(r"^\s*{t}{key}\s*;"))?,
            cast: compile(format!(r#"\b{t}\[\s*"Entity"\s*\]\s*\[\s*"(as_\w+)"\s*\]"#))?,
        })
    }
}

/// Line-level findings from one binding source.
#[derive(Debug, Default)]
pub struct BindingScan {
    pub functions: Vec<FunctionBinding>,
    pub events: Vec<EventName>,
    pub casts: Vec<String>,
    /// Docs preceding a `new_usertype<Native>` line, keyed by native class.
    pub usertype_docs: Vec<(String, Vec<String>)>,
}

pub fn scan_bindings(input: &str, patterns: &BindingPatterns) -> BindingScan {
    let mut scan = BindingScan::default();
    let mut docs: Vec<String> = Vec::new();

    for line in input.lines() {
        if let Some(doc) = doc_line(line) {
            docs.push(doc);
            continue;
        }

        for caps in patterns.cast.captures_iter(line) {
            scan.casts.push(caps[1].to_string());
        }

        let code = code_part(line);
        if let Some(caps) = patterns.event.captures(code) {
            scan.events.push(EventName {
                name: caps[1].to_string(),
                docs: std::mem::take(&mut docs),
            });
            continue;
        }

        if let Some(caps) = patterns.assignment.captures(code) {
            let name = &caps[1];
            if !name.starts_with("__") {
                let native = caps[2].trim().trim_end_matches(';').trim();
                scan.functions.push(FunctionBinding {
                    script_name: name.to_string(),
                    native: native.to_string(),
                    docs: std::mem::take(&mut docs),
                });
                continue;
            }
        }

        if let Some(caps) = RE_USERTYPE_CALL.captures(code) {
            if !docs.is_empty() {
                scan.usertype_docs
                    .push((caps[1].to_string(), std::mem::take(&mut docs)));
            }
            continue;
        }

        docs.clear();
    }

    scan
}
