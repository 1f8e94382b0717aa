//! C++ → TypeScript type translation.
//!
//! `translate` runs a fixed pipeline over arbitrary type text:
//!
//! 1. ordered substitution rules (skipping matches inside `` `code` `` spans)
//! 2. numeric primitives → `number`
//! 3. `Array<T, N, ...>` → `Array<T>` (to a fixed point)
//! 4. `tuple<A, B>` → `LuaMultiReturn<[A, B]>`
//! 5. `bool` → `boolean`
//! 6. `optional<T>` → `T | undefined`
//!
//! Unknown shapes pass through untouched; nothing here can fail.

use regex::Regex;
use std::sync::LazyLock;

// -- Substitution table -------------------------------------------------------

/// One ordered rewrite. `word` rules only match on identifier boundaries.
struct Rule {
    find: &'static str,
    replace: &'static str,
    word: bool,
}

const fn literal(find: &'static str, replace: &'static str) -> Rule {
    Rule {
        find,
        replace,
        word: false,
    }
}

const fn word(find: &'static str, replace: &'static str) -> Rule {
    Rule {
        find,
        replace,
        word: true,
    }
}

const SUBSTITUTIONS: &[Rule] = &[
    literal("std::", ""),
    literal("sol::", ""),
    literal("const char*", "string"),
    word("const char", "string"),
    word("const string", "string"),
    word("const ", ""),
    word("wstring", "string"),
    word("u16string", "string"),
    word("string_view", "string"),
    word("char16_t", "string"),
    word("unordered_map<", "LuaTable<"),
    word("map<", "LuaTable<"),
    word("unordered_set<", "Array<"),
    word("set<", "Array<"),
    word("vector<", "Array<"),
    word("array<", "Array<"),
    word("span<", "Array<"),
    word("pair<", "tuple<"),
    word("function", "Callback"),
    literal(" = nullopt", ""),
    word("constexpr", ""),
    literal("...va:", "...ent_type:"),
    literal("// Access via", "void"),
    literal("&", ""),
    literal("*", ""),
];

impl Rule {
    fn pattern(&self) -> Regex {
        let mut pattern = String::new();
        let starts_word = self.find.starts_with(|c: char| c.is_alphanumeric() || c == '_');
        let ends_word = self.find.ends_with(|c: char| c.is_alphanumeric() || c == '_');
        if self.word && starts_word {
            pattern.push_str(r"\b");
        }
        pattern.push_str(&regex::escape(self.find));
        if self.word && ends_word {
            pattern.push_str(r"\b");
        }
        Regex::new(&pattern).unwrap()
    }
}

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SUBSTITUTIONS
        .iter()
        .map(|rule| (rule.pattern(), rule.replace))
        .collect()
});

static RE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:(?:(?:un)?signed\s+)?",
        r"(?:u?int(?:8|16|32|64)_t|uint|int|short|long\s+long|long|float|double|size_t|ImU32)",
        r"|(?:un)?signed)\b"
    ))
    .unwrap()
});

static RE_BOOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bbool\b").unwrap());

// -- Public API ---------------------------------------------------------------

/// Translate C++ type text into TypeScript type text.
pub fn translate(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in COMPILED.iter() {
        out = replace_outside_code_spans(&out, re, replacement);
    }
    out = RE_NUMERIC.replace_all(&out, "number").into_owned();
    out = fixed_point(out, |t| {
        rewrite_template(t, "Array", &|args: &[String]| format!("Array<{}>", args[0]))
    });
    out = rewrite_template(&out, "Callback", &|_: &[String]| "Callback".to_string());
    out = rewrite_template(&out, "tuple", &|args: &[String]| {
        format!("LuaMultiReturn<[{}]>", args.join(", "))
    });
    out = RE_BOOL.replace_all(&out, "boolean").into_owned();
    rewrite_template(&out, "optional", &|args: &[String]| {
        format!("{} | undefined", args.join(", "))
    })
}

/// Convert a C++ parameter list into TypeScript parameter text.
pub fn params_to_ts(params: &str) -> String {
    convert_params(params, false)
}

/// Parameter conversion for constructors: an unnamed `const T` parameter
/// becomes `T: T`.
pub fn fix_constructor_params(params: &str) -> String {
    convert_params(params, true)
}

/// Translate a return type, defaulting to `void`.
pub fn return_type(text: &str) -> String {
    let ty = translate(text).trim().to_string();
    if ty.is_empty() {
        "void".to_string()
    } else {
        ty
    }
}

/// Split `text` at `sep` characters that are not nested inside brackets
/// or string literals. `->` does not count as a closing angle bracket.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    let mut prev = '\0';

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            prev = c;
            continue;
        }
        match c {
            '"' => in_string = true,
            '<' | '(' | '[' | '{' => depth += 1,
            '>' if prev == '-' => {}
            '>' | ')' | ']' | '}' => depth -= 1,
            _ if c == sep && depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
        prev = c;
    }
    parts.push(&text[start..]);
    parts
}

// -- Passes -------------------------------------------------------------------

/// Replace every match of `re`, except matches strictly inside an inline
/// code span (odd number of back-ticks before, at least one after).
fn replace_outside_code_spans(text: &str, re: &Regex, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if in_code_span(text, m.start(), m.end()) {
            out.push_str(m.as_str());
        } else {
            out.push_str(replacement);
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn in_code_span(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].matches('`').count();
    before % 2 == 1 && text[end..].contains('`')
}

fn fixed_point(mut text: String, pass: impl Fn(&str) -> String) -> String {
    loop {
        let next = pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Rewrite every `name<args>` instantiation via `build`, innermost
/// arguments first. `build` receives the trimmed, already-rewritten
/// top-level arguments.
fn rewrite_template(text: &str, name: &str, build: &dyn Fn(&[String]) -> String) -> String {
    let opener = format!("{}<", name);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = find_template(rest, &opener) {
        out.push_str(&rest[..pos]);
        let inner_start = pos + opener.len();
        let Some(close) = matching_angle(&rest[inner_start..]) else {
            // Unbalanced: leave the remainder alone.
            out.push_str(&rest[pos..]);
            return out;
        };
        let inner = &rest[inner_start..inner_start + close];
        let args: Vec<String> = split_top_level(inner, ',')
            .into_iter()
            .map(|arg| rewrite_template(arg.trim(), name, build))
            .collect();
        out.push_str(&build(&args));
        rest = &rest[inner_start + close + 1..];
    }
    out.push_str(rest);
    out
}

/// Byte offset of `opener` where it starts a whole identifier.
fn find_template(text: &str, opener: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = text[from..].find(opener) {
        let pos = from + found;
        let boundary = text[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if boundary {
            return Some(pos);
        }
        from = pos + opener.len();
    }
    None
}

/// Offset of the `>` closing an already-opened angle bracket.
fn matching_angle(text: &str) -> Option<usize> {
    let mut depth = 1;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        prev = c;
    }
    None
}

// -- Parameters ---------------------------------------------------------------

static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

static RE_ARRAY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\[[^\]]*\]$").unwrap());

fn convert_params(params: &str, const_fix: bool) -> String {
    let converted: Vec<String> = split_top_level(params, ',')
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| convert_param(p, i, const_fix))
        .collect();
    translate(&converted.join(", "))
}

fn convert_param(param: &str, index: usize, const_fix: bool) -> Option<String> {
    // Drop a default value
    let param = split_top_level(param, '=')[0].trim();
    if param.is_empty() || param == "void" {
        return None;
    }

    let (is_const, rest) = match param.strip_prefix("const ") {
        Some(rest) => (true, rest.trim()),
        None => (false, param),
    };

    if rest.starts_with("sol::variadic_args") || rest.starts_with("variadic_args") {
        let name = rest.rsplit(char::is_whitespace).next().unwrap_or("args");
        return Some(format!("...{}: any[]", name));
    }

    // `const char` translates to `string`, so the qualifier stays on the type
    let qualified = |ty: String| if is_const { format!("const {}", ty) } else { ty };
    match split_type_name(rest) {
        (ty, Some(name)) => Some(format!("{}: {}", name, qualified(ty))),
        (ty, None) if const_fix && is_const => {
            let bare = ty.trim_end_matches(['&', '*']).trim();
            Some(format!("{}: {}", bare, bare))
        }
        (ty, None) => Some(format!("arg{}: {}", index, qualified(ty))),
    }
}

/// Split `Type name` at the last top-level space. `&`/`*` glued to the name
/// move back onto the type; `name[N]` becomes `array<Type>`.
pub(crate) fn split_type_name(param: &str) -> (String, Option<String>) {
    let Some(cut) = last_top_level_space(param) else {
        return (param.to_string(), None);
    };
    let ty = param[..cut].trim();
    let raw_name = param[cut..].trim();
    let name = raw_name.trim_start_matches(['&', '*']);
    let glued = &raw_name[..raw_name.len() - name.len()];
    let ty = format!("{}{}", ty, glued);

    if RE_IDENT.is_match(name) {
        return (ty, Some(name.to_string()));
    }
    if let Some(caps) = RE_ARRAY_NAME.captures(name) {
        return (format!("array<{}>", ty), Some(caps[1].to_string()));
    }
    (param.to_string(), None)
}

fn last_top_level_space(text: &str) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut cut = None;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => cut = Some(i),
            _ => {}
        }
    }
    // A trailing space is not a separator
    cut.filter(|&i| !text[i..].trim().is_empty())
}
