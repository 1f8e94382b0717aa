//! Class-record pass: member functions and variables of every top-level
//! `struct`/`class` body.
//!
//! A record opens on a line starting with `struct Name` or `class Name` and
//! closes when brace depth returns to zero. Inside it, members are captured
//! at depth 1. An anonymous `union` at depth 1 and an anonymous `struct`
//! directly inside it are flattened: their members are captured at depth 2
//! and 3 and belong to the enclosing record.

use super::header::{parse_declaration, strip_specifiers};
use super::{brace_delta, code_part, doc_line};
use crate::model::{ClassRecord, MemberVariable, RawSignature};
use crate::translate::{split_type_name, translate};
use regex::Regex;
use std::sync::LazyLock;

static RE_RECORD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:struct|class)\s+([A-Za-z_]\w*)").unwrap());

static RE_INLINE_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:struct|class|union)\b[^;{]*\{").unwrap());

static RE_BITFIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*:\s*\d+$").unwrap());

static RE_ARRAY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*\[[^\]]*\])+$").unwrap());

static RE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Statements that never declare a member.
const SKIPPED_PREFIXES: &[&str] = &[
    "using ",
    "typedef ",
    "friend ",
    "return ",
    "static_assert",
    "template",
    "public:",
    "private:",
    "protected:",
    "#",
    "//",
    "{",
    "}",
];

/// Where the scanner is relative to the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    InRecord,
    InUnion,
    InAnonStruct,
}

impl ScanState {
    /// Depth (before the line) at which member lines are captured.
    fn capture_depth(self) -> Option<i32> {
        match self {
            ScanState::Outside => None,
            ScanState::InRecord => Some(1),
            ScanState::InUnion => Some(2),
            ScanState::InAnonStruct => Some(3),
        }
    }
}

/// Next state after a line that moved depth from `before` to `after`.
/// Opening and closing the record itself is handled by the scanner.
pub fn transition(state: ScanState, before: i32, after: i32, line: &str) -> ScanState {
    let trimmed = code_part(line).trim();
    match state {
        ScanState::InRecord if before == 1 && opens_anonymous(trimmed, "union") => {
            ScanState::InUnion
        }
        ScanState::InUnion if before == 2 && opens_anonymous(trimmed, "struct") => {
            ScanState::InAnonStruct
        }
        ScanState::InAnonStruct if after < before && after <= 1 => ScanState::InRecord,
        ScanState::InAnonStruct if after < before && after <= 2 => ScanState::InUnion,
        ScanState::InUnion if after < before && after <= 1 => ScanState::InRecord,
        other => other,
    }
}

/// `union`, `union {` and friends, without a name.
fn opens_anonymous(trimmed: &str, keyword: &str) -> bool {
    trimmed
        .strip_prefix(keyword)
        .is_some_and(|rest| matches!(rest.trim(), "" | "{"))
}

#[derive(Debug)]
struct RecordScanner {
    state: ScanState,
    depth: i32,
    entered: bool,
    record: Option<ClassRecord>,
    docs: Vec<String>,
    finished: Vec<ClassRecord>,
}

impl RecordScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Outside,
            depth: 0,
            entered: false,
            record: None,
            docs: Vec::new(),
            finished: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if self.state == ScanState::Outside {
            self.open(line);
            return;
        }

        let before = self.depth;
        self.depth += brace_delta(line);
        if self.depth > 0 {
            self.entered = true;
        }
        self.state = transition(self.state, before, self.depth, line);

        if self.entered && self.depth <= 0 {
            self.close();
            return;
        }
        if self.state.capture_depth() == Some(before) {
            self.capture(line);
        }
    }

    fn open(&mut self, line: &str) {
        let code = code_part(line).trim_end();
        let Some(caps) = RE_RECORD_OPEN.captures(code) else {
            return;
        };
        // Forward declarations and `struct Foo bar;` variables
        if code.ends_with(';') {
            return;
        }
        self.record = Some(ClassRecord::new(&caps[1]));
        self.state = ScanState::InRecord;
        self.depth = brace_delta(line);
        self.entered = self.depth > 0;
        self.docs.clear();
    }

    fn close(&mut self) {
        if let Some(record) = self.record.take() {
            self.finished.push(record);
        }
        self.state = ScanState::Outside;
        self.depth = 0;
        self.entered = false;
        self.docs.clear();
    }

    fn capture(&mut self, line: &str) {
        let trimmed = line.trim();
        if let Some(doc) = doc_line(trimmed) {
            self.docs.push(doc);
            return;
        }
        // Initializer-list continuation
        if trimmed.starts_with(':') {
            return;
        }
        if trimmed.is_empty() || SKIPPED_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            self.docs.clear();
            return;
        }

        let Some(record) = self.record.as_mut() else {
            return;
        };
        let docs = std::mem::take(&mut self.docs);
        if let Some(sig) = parse_member_function(trimmed, &record.name) {
            record.add_function(RawSignature { docs, ..sig });
        } else if let Some(var) = parse_member_variable(trimmed) {
            record.variables.push(MemberVariable { docs, ..var });
        }
    }

    fn finish(mut self) -> Vec<ClassRecord> {
        // Unterminated record at end of input
        if self.entered {
            self.close();
        }
        self.finished
    }
}

/// All records in one header, in source order.
pub fn scan_records(input: &str) -> Vec<ClassRecord> {
    let mut scanner = RecordScanner::new();
    for line in logical_lines(input) {
        scanner.feed(&line);
    }
    scanner.finish()
}

/// Split one-line bodies so each statement sits on its own line:
/// `struct Foo { int x; };` becomes `struct Foo {`, `int x;`, `};`.
fn logical_lines(input: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in input.lines() {
        let line = raw.replace('*', "");
        if line.trim_start().starts_with("//") {
            lines.push(line);
            continue;
        }

        let mut pending = line.as_str();
        if let Some(m) = RE_INLINE_OPENER.find(pending) {
            let tail = &pending[m.end()..];
            if !code_part(tail).trim().is_empty() {
                lines.push(pending[..m.end()].to_string());
                pending = tail;
            }
        }

        let (body, closers) = peel_closers(pending);
        lines.push(body);
        lines.extend(closers);
    }
    lines
}

/// Split trailing `}`/`};` off a line that closes more braces than it opens.
fn peel_closers(line: &str) -> (String, Vec<String>) {
    let mut body = line.trim_end().to_string();
    let mut closers = Vec::new();
    while brace_delta(&body) < 0 {
        let trimmed = body.trim_end();
        let cut = if trimmed.ends_with("};") {
            trimmed.len() - 2
        } else if trimmed.ends_with('}') {
            trimmed.len() - 1
        } else {
            break;
        };
        let head = trimmed[..cut].trim_end();
        if head.trim().is_empty() {
            break;
        }
        closers.insert(0, trimmed[cut..].to_string());
        body = head.to_string();
    }
    (body, closers)
}

/// Member function, constructor or static method on one line. Move
/// constructors and deleted functions are dropped.
fn parse_member_function(line: &str, class_name: &str) -> Option<RawSignature> {
    let padded = format!(" {}", line);
    let raw = parse_declaration(&padded)?;
    if raw.name.starts_with("operator") {
        return None;
    }
    if is_move_constructor(&strip_specifiers(&raw.return_type, false), &raw, class_name) {
        return None;
    }
    let after_params = code_part(line).rsplit(')').next().unwrap_or("");
    if after_params.contains("= delete") || after_params.contains("=delete") {
        return None;
    }

    let translated = parse_declaration(&format!(" {}", translate(line)))?;
    Some(RawSignature {
        return_type: strip_specifiers(&translated.return_type, true),
        name: raw.name,
        params: raw.params,
        docs: Vec::new(),
    })
}

/// `Foo(Foo&& other)` with no return type.
fn is_move_constructor(return_type: &str, sig: &RawSignature, class_name: &str) -> bool {
    if !return_type.is_empty() || sig.name != class_name {
        return false;
    }
    let params = sig.params.trim();
    params
        .strip_prefix(class_name)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix("&&"))
        .is_some_and(|rest| !rest.contains(','))
}

/// `Type name;`, `Type name{init};`, `Type name = init;` or `Type name[N];`.
fn parse_member_variable(line: &str) -> Option<MemberVariable> {
    let code = code_part(line).trim();
    let body = code.strip_suffix(';')?.trim();
    if body.starts_with("enum ") || body.contains("operator") {
        return None;
    }
    let body = match body.strip_suffix('}').and_then(|b| b.rfind('{').map(|i| &b[..i])) {
        Some(head) => head.trim(),
        None => body,
    };
    let body = body.split('=').next().unwrap_or(body).trim();
    let body = RE_BITFIELD.replace(body, "");
    let is_array = RE_ARRAY_SUFFIX.is_match(&body);
    let body = RE_ARRAY_SUFFIX.replace(&body, "");

    let (ty, name) = split_type_name(body.trim());
    let name = name.filter(|n| RE_IDENT.is_match(n))?;
    let ty = strip_specifiers(&ty, false);
    let ty = ["struct ", "class ", "enum "]
        .iter()
        .fold(ty.as_str(), |t, kw| t.strip_prefix(kw).unwrap_or(t))
        .trim()
        .to_string();
    if ty.is_empty() {
        return None;
    }
    let ty = if is_array { format!("Array<{}>", ty) } else { ty };

    Some(MemberVariable {
        ty: translate(&ty),
        name,
        docs: Vec::new(),
    })
}
