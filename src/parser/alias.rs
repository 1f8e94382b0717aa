//! `using Name = Type;` lines from the alias header.

use crate::model::Alias;
use crate::translate::translate;
use regex::Regex;
use std::sync::LazyLock;

static RE_USING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*using\s+(\w+)\s*=\s*([^;]+);").unwrap());

/// Opt-out marker at the end of a line.
const NO_ALIAS: &str = "NoAlias";

pub fn scan_aliases(input: &str) -> Vec<Alias> {
    input
        .lines()
        .filter(|line| !line.trim_end().ends_with(NO_ALIAS))
        .filter_map(|line| RE_USING.captures(line))
        .map(|caps| Alias {
            name: caps[1].to_string(),
            ty: translate(caps[2].trim()).trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_translated() {
        let aliases = scan_aliases("using CallbackId = int;\nusing Names = std::vector<std::string>;\n");
        assert_eq!(
            aliases,
            [
                Alias { name: "CallbackId".to_string(), ty: "number".to_string() },
                Alias { name: "Names".to_string(), ty: "Array<string>".to_string() },
            ]
        );
    }

    #[test]
    fn marked_lines_are_skipped() {
        let aliases = scan_aliases("using Internal = uint8_t; // NoAlias\nusing Flags = uint32_t;\n");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].name, "Flags");
    }

    #[test]
    fn other_using_forms_are_ignored() {
        assert!(scan_aliases("using namespace std;\nusing Base::Base;\n").is_empty());
    }
}
