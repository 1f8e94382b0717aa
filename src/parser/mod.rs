//! Parser module — line scanners over headers, binding sources and data files.

pub mod alias;
pub mod binding;
pub mod enums;
pub mod header;
pub mod merge;
pub mod record;
pub mod usertype;

pub use merge::CorpusBuilder;

use crate::model::{ClassRecord, RawSignature};
use regex::Regex;
use std::sync::LazyLock;

static RE_DOC_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*/// ?(.*)$").unwrap());

/// Result of both header passes over one file.
#[derive(Debug, Default)]
pub struct HeaderScan {
    pub rpc: Vec<RawSignature>,
    pub classes: Vec<ClassRecord>,
}

/// Run the RPC pass and, unless this is the RPC header itself, the
/// class-record pass over one header.
pub fn scan_header(content: &str, is_rpc_header: bool) -> HeaderScan {
    HeaderScan {
        rpc: header::scan_rpc(content, is_rpc_header),
        classes: if is_rpc_header {
            Vec::new()
        } else {
            record::scan_records(content)
        },
    }
}

/// Text of a `/// doc` line, without the marker.
pub(crate) fn doc_line(line: &str) -> Option<String> {
    RE_DOC_COMMENT
        .captures(line)
        .map(|caps| caps[1].trim_end().to_string())
}

/// The line with any trailing `//` comment removed.
pub(crate) fn code_part(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Net change in brace depth contributed by the code part of a line.
pub(crate) fn brace_delta(line: &str) -> i32 {
    code_part(line).chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}
