//! Join usertype registrations against class records.
//!
//! Each attribute's native expression is reduced to a member name and looked
//! up in the class record: member functions first, then member variables.
//! Anything left over becomes an opaque field; resolution never fails.

use crate::model::*;
use crate::translate::{fix_constructor_params, params_to_ts, return_type, split_top_level};
use regex::Regex;
use std::sync::LazyLock;

static RE_LAMBDA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]*\]\(([^)]*)\)(?:->([^{]*))?").unwrap());

/// Resolve every usertype in registration order.
pub fn resolve(corpus: &Corpus) -> Vec<ExposedType> {
    let mut types = Vec::new();
    for usertype in corpus.usertypes.values() {
        let Some(record) = corpus.classes.get(&usertype.native_class) else {
            tracing::warn!(
                usertype = %usertype.script_name,
                class = %usertype.native_class,
                "no class record for usertype, skipping"
            );
            continue;
        };
        types.push(resolve_usertype(corpus, usertype, record));
    }
    tracing::info!(count = types.len(), "resolved usertypes");
    types
}

fn resolve_usertype(corpus: &Corpus, usertype: &Usertype, record: &ClassRecord) -> ExposedType {
    let mut members = Vec::new();
    for attribute in &usertype.attributes {
        match attribute {
            Attribute::Constructors => members.extend(constructors(record)),
            Attribute::Member { name, expr } => {
                resolve_member(corpus, record, name, expr, &mut members)
            }
        }
    }

    ExposedType {
        script_name: usertype.script_name.clone(),
        native_class: usertype.native_class.clone(),
        bases: usertype.bases.clone(),
        members,
        docs: usertype.docs.clone(),
    }
}

/// One constructor per overload of the self-named member function.
fn constructors(record: &ClassRecord) -> Vec<ResolvedMember> {
    let Some(overloads) = record.functions.get(&record.name) else {
        return Vec::new();
    };
    overloads
        .iter()
        .filter(|sig| sig.params.trim() != record.name)
        .map(|sig| {
            let params = if sig.params.contains("const") {
                fix_constructor_params(&sig.params)
            } else {
                params_to_ts(&sig.params)
            };
            ResolvedMember {
                name: "constructor".to_string(),
                kind: MemberKind::Constructor { params },
                docs: sig.docs.clone(),
            }
        })
        .collect()
}

/// What a wrapped expression resolves to once its wrappers are peeled.
#[derive(Debug, PartialEq)]
enum Target<'a> {
    Plain(&'a str),
    TableOf(&'a str),
    Property(&'a str),
    Overload(Vec<&'a str>),
}

fn unwrap_expr(expr: &str) -> Target<'_> {
    let mut expr = expr.trim();
    loop {
        let bare = expr.strip_prefix("sol::").unwrap_or(expr);
        if let Some(inner) = call_args(bare, "readonly")
            .or_else(|| call_args(bare, "readonly_property"))
            .or_else(|| call_args(bare, "var"))
            .or_else(|| call_args(bare, "move"))
            .or_else(|| call_args(bare, "std::move"))
        {
            expr = inner.trim();
            continue;
        }
        if let Some(inner) = call_args(bare, "table_of") {
            return Target::TableOf(inner.trim());
        }
        if let Some(inner) = call_args(bare, "property") {
            let getter = split_top_level(inner, ',')[0].trim();
            return Target::Property(getter);
        }
        if let Some(inner) = call_args(bare, "overload") {
            let alternatives = split_top_level(inner, ',')
                .into_iter()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .collect();
            return Target::Overload(alternatives);
        }
        return Target::Plain(expr);
    }
}

/// `name(args)` → `args`, only when the call spans the whole expression.
fn call_args<'a>(expr: &'a str, name: &str) -> Option<&'a str> {
    let rest = expr.strip_prefix(name)?;
    let rest = match rest.strip_prefix('<') {
        // Explicit template arguments, e.g. `sol::readonly<T>(...)`
        Some(_) => &rest[rest.find('>')? + 1..],
        None => rest,
    };
    rest.strip_prefix('(')?.strip_suffix(')')
}

/// `&Movable::velocityx` → (`Some("Movable")`, `"velocityx"`).
fn member_path(expr: &str) -> (Option<&str>, &str) {
    let expr = expr.trim().trim_start_matches('&').trim_end_matches(')');
    match expr.rsplit_once("::") {
        Some((qualifier, name)) => {
            let class = qualifier.rsplit("::").next().filter(|c| !c.is_empty());
            (class, name)
        }
        None => (None, expr),
    }
}

/// Record owning a qualified member: the named class when one was scanned,
/// the usertype's own record otherwise.
fn owner<'a>(corpus: &'a Corpus, record: &'a ClassRecord, class: Option<&str>) -> &'a ClassRecord {
    class
        .and_then(|c| corpus.classes.get(c))
        .unwrap_or(record)
}

fn resolve_member(
    corpus: &Corpus,
    record: &ClassRecord,
    name: &str,
    expr: &str,
    members: &mut Vec<ResolvedMember>,
) {
    match unwrap_expr(expr) {
        Target::Plain(inner) => {
            if !push_methods(corpus, record, name, inner, members) {
                members.push(field(corpus, record, name, inner, false));
            }
        }
        Target::TableOf(inner) => members.push(field(corpus, record, name, inner, true)),
        Target::Property(getter) => {
            let (class, native) = member_path(getter);
            let source = owner(corpus, record, class);
            let member = match source.functions.get(native).and_then(|o| o.first()) {
                Some(sig) => ResolvedMember {
                    name: name.to_string(),
                    kind: MemberKind::Field {
                        ty: FieldType::Declared(return_type(strip_static(&sig.return_type).1)),
                    },
                    docs: sig.docs.clone(),
                },
                None => field(corpus, record, name, getter, false),
            };
            members.push(member);
        }
        Target::Overload(alternatives) => {
            let before = members.len();
            for alternative in alternatives {
                push_methods(corpus, record, name, alternative, members);
            }
            if members.len() == before {
                members.push(opaque(name, expr));
            }
        }
    }
}

/// One method per native overload. Returns `false` when nothing matched.
fn push_methods(
    corpus: &Corpus,
    record: &ClassRecord,
    name: &str,
    expr: &str,
    members: &mut Vec<ResolvedMember>,
) -> bool {
    let (class, native) = member_path(expr);
    let Some(overloads) = owner(corpus, record, class).functions.get(native) else {
        return false;
    };
    for sig in overloads {
        let (is_static, ret) = strip_static(&sig.return_type);
        members.push(ResolvedMember {
            name: name.to_string(),
            kind: MemberKind::Method {
                return_type: return_type(ret),
                params: params_to_ts(&sig.params),
                is_static,
            },
            docs: sig.docs.clone(),
        });
    }
    true
}

fn field(corpus: &Corpus, record: &ClassRecord, name: &str, expr: &str, table: bool) -> ResolvedMember {
    let (class, native) = member_path(expr);
    let Some(var) = owner(corpus, record, class).variable(native) else {
        return opaque(name, expr);
    };
    let ty = if table { table_type(&var.ty) } else { var.ty.clone() };
    ResolvedMember {
        name: name.to_string(),
        kind: MemberKind::Field {
            ty: FieldType::Declared(ty),
        },
        docs: var.docs.clone(),
    }
}

/// `Array<T>` → `T[]`, anything else gets `[]` appended.
fn table_type(ty: &str) -> String {
    match ty.strip_prefix("Array<").and_then(|t| t.strip_suffix('>')) {
        Some(inner) => format!("{}[]", inner),
        None => format!("{}[]", ty),
    }
}

/// A member with no native match. Boolean lambdas taking only `self`
/// keep their accessor shape.
fn opaque(name: &str, expr: &str) -> ResolvedMember {
    let ty = match RE_LAMBDA.captures(expr.trim()) {
        Some(caps) if is_bool_accessor(&caps[1], caps.get(2).map(|m| m.as_str())) => {
            FieldType::Accessor {
                params: String::new(),
            }
        }
        _ => FieldType::Unknown,
    };
    tracing::debug!(member = name, "unresolved member rendered as opaque field");
    ResolvedMember {
        name: name.to_string(),
        kind: MemberKind::Field { ty },
        docs: Vec::new(),
    }
}

fn is_bool_accessor(params: &str, ret: Option<&str>) -> bool {
    let param_count = split_top_level(params, ',')
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .count();
    param_count <= 1 && ret.is_some_and(|r| r.trim() == "bool")
}

fn strip_static(ret: &str) -> (bool, &str) {
    match ret.trim().strip_prefix("static ") {
        Some(rest) => (true, rest.trim()),
        None => (false, ret.trim()),
    }
}
