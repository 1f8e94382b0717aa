//! Literal find/replace patches applied to the finished declaration text.
//!
//! ```toml
//! [[patch]]
//! find = "is_poisoned: (() => {}) | boolean"
//! replace = "is_poisoned: boolean"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Patch {
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Default, Deserialize)]
struct PatchFile {
    #[serde(default)]
    patch: Vec<Patch>,
}

/// Parse a patch table from TOML text.
pub fn parse(content: &str) -> Result<Vec<Patch>> {
    let file: PatchFile = toml::from_str(content).context("invalid patch table")?;
    Ok(file.patch)
}

pub fn load(path: &Path) -> Result<Vec<Patch>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read patches at {}", path.display()))?;
    parse(&content).with_context(|| format!("Failed to parse patches at {}", path.display()))
}

/// Apply every patch in order, replacing all occurrences. Each patch sees
/// the output of the previous one.
pub fn apply(text: &str, patches: &[Patch]) -> String {
    let mut out = text.to_string();
    for patch in patches {
        if patch.find.is_empty() || !out.contains(&patch.find) {
            tracing::warn!(find = %patch.find, "patch matched nothing");
            continue;
        }
        out = out.replace(&patch.find, &patch.replace);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(find: &str, replace: &str) -> Patch {
        Patch {
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }

    #[test]
    fn parse_table() {
        let patches = parse(
            r#"
[[patch]]
find = "a"
replace = "b"

[[patch]]
find = "c"
replace = ""
"#,
        )
        .unwrap();
        assert_eq!(patches, [patch("a", "b"), patch("c", "")]);
    }

    #[test]
    fn empty_file_has_no_patches() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(parse("[[patch]]\nfind = \"a\"\n").is_err());
    }

    #[test]
    fn applied_in_order() {
        let patches = [patch("foo", "bar"), patch("bar", "baz")];
        assert_eq!(apply("foo bar", &patches), "baz baz");
    }

    #[test]
    fn unmatched_patch_leaves_text() {
        assert_eq!(apply("text", &[patch("absent", "x")]), "text");
    }
}
