//! TypeScript declaration renderer.
//!
//! Sections in fixed order: preamble, functions, types, enums, supplemental
//! declarations, aliases.

use crate::model::*;
use crate::render::{RenderOptions, Renderer};
use crate::translate::{params_to_ts, return_type, split_top_level};
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

pub const PREAMBLE: &str = "\
/** @noSelfInFile */
declare interface Meta {
    name: string;
    version: string;
    description: string;
    author: string;
}
declare let meta: Meta;

declare const state: StateMemory;
declare const game_manager: GameManager;
declare const online: Online;
declare const players: Array<Player>;
declare const savegame: SaveData;
declare const options: any;
declare const prng: PRNG;
declare interface Callback {
    (...args: any[]): any;
}
declare interface SoundCallbackFunction extends Callback {}
";

/// Types the scanned corpus cannot discover.
pub const SUPPLEMENT: &str = "\
declare const MAX_PLAYERS: number
declare type in_port_t = number
declare class Logic {}
declare class UdpServer {
    constructor(host: string, port: in_port_t, cb: Callback);
    host: string;
    port: in_port_t;
    cb: Callback;
    sock: any;
}
declare type IMAGE = number
declare class Texture {
    id: TEXTURE;
    name: string;
    width: number;
    height: number;
    num_tiles_width: number;
    num_tiles_height: number;
    offset_x_weird_math: number;
    offset_y_weird_math: number;
    tile_width_fraction: number;
    tile_height_fraction: number;
    tile_width_minus_one_fraction: number;
    tile_height_minus_one_fraction: number;
    one_over_width: number;
    one_over_height: number;
}
declare class SpearDanglerAnimFrames {
    column: number;
    row: number;
}
declare class OnlineLobbyScreenPlayer {
    unknown1: number;
    character: number;
    ready: boolean;
    unknown2: number;
}
declare type OnlinePlayerShort = any
";

static RE_LAMBDA_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^\{]*)\)\s*->\s*([^\{]*)").unwrap());

static RE_LAMBDA_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^\{]*)\)").unwrap());

const INDENT: &str = "    ";

pub struct TypescriptRenderer {
    options: RenderOptions,
}

impl TypescriptRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Renderer for TypescriptRenderer {
    fn render(&self, surface: &Surface) -> Result<String> {
        let corpus = &surface.corpus;
        let mut out = String::new();

        let preamble = self.options.preamble.as_deref().unwrap_or(PREAMBLE);
        push_block(&mut out, preamble);
        out.push('\n');

        out.push_str("//## Functions\n");
        let mut count = 0;
        for binding in corpus.functions.values() {
            if !self.is_function(corpus, binding) {
                tracing::debug!(function = %binding.script_name, "not rendered as a function");
                continue;
            }
            for line in function_declarations(corpus, binding) {
                out.push_str(&line);
                count += 1;
            }
        }
        tracing::info!(count, "rendered function declarations");
        out.push('\n');

        out.push_str("//## Types\n");
        for ty in &surface.types {
            render_class(&mut out, ty);
        }
        out.push('\n');

        out.push_str("//## Enums\n");
        for block in &corpus.enums {
            out.push_str(&format!("declare enum {} {{\n{}\n}}\n", block.name, block.body));
        }
        out.push('\n');

        let supplement = self.options.supplement.as_deref().unwrap_or(SUPPLEMENT);
        push_block(&mut out, supplement);
        out.push('\n');

        out.push_str("//## Aliases\n");
        for alias in corpus.aliases.values() {
            out.push_str(&format!("declare type {} = {}\n", alias.name, alias.ty));
        }

        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "d.ts"
    }

    fn patchable(&self) -> bool {
        true
    }
}

impl TypescriptRenderer {
    fn is_function(&self, corpus: &Corpus, binding: &FunctionBinding) -> bool {
        let name = binding.script_name.as_str();
        !(binding.has_marker("Deprecated")
            || binding.has_marker("NoDoc")
            || name.starts_with("on_")
            || corpus.is_event(name)
            || self.options.globals.iter().any(|g| g == name))
    }
}

/// Declarations for one binding: one per RPC overload when the native
/// expression names RPC functions, else one derived from the lambda text.
fn function_declarations(corpus: &Corpus, binding: &FunctionBinding) -> Vec<String> {
    let name = &binding.script_name;
    let overloads: Vec<&RawSignature> = native_names(&binding.native)
        .into_iter()
        .flat_map(|native| corpus.rpc_named(native))
        .collect();

    if !overloads.is_empty() {
        return overloads
            .into_iter()
            .map(|sig| {
                let docs = if binding.docs.is_empty() { &sig.docs } else { &binding.docs };
                let mut out = doc_block(docs, "");
                out.push_str(&format!(
                    "declare function {}({}): {}\n",
                    name,
                    params_to_ts(&sig.params),
                    return_type(&sig.return_type)
                ));
                out
            })
            .collect();
    }

    let (params, ret) = match RE_LAMBDA_ARROW.captures(&binding.native) {
        Some(caps) => (params_to_ts(&caps[1]), return_type(&caps[2])),
        None => match RE_LAMBDA_PARAMS.captures(&binding.native) {
            Some(caps) => (params_to_ts(&caps[1]), "void".to_string()),
            None => (String::new(), "void".to_string()),
        },
    };
    let mut out = doc_block(&binding.docs, "");
    out.push_str(&format!("declare function {}({}): {}\n", name, params, ret));
    vec![out]
}

/// Function names a native expression refers to: `&foo`, `::foo` and each
/// alternative of `sol::overload(...)`.
fn native_names(native: &str) -> Vec<&str> {
    let native = native.trim();
    let bare = native.strip_prefix("sol::").unwrap_or(native);
    if let Some(inner) = bare
        .strip_prefix("overload(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return split_top_level(inner, ',')
            .into_iter()
            .map(function_name)
            .collect();
    }
    vec![function_name(native)]
}

fn function_name(expr: &str) -> &str {
    expr.trim().trim_start_matches('&').trim_start_matches("::")
}

fn render_class(out: &mut String, ty: &ExposedType) {
    out.push_str(&doc_block(&ty.docs, ""));
    out.push_str(&format!("declare class {}", ty.script_name));
    if let Some(base) = ty.bases.last() {
        out.push_str(&format!(" extends {}", base));
    }
    out.push_str(" {\n");
    for member in &ty.members {
        out.push_str(&doc_block(&member.docs, INDENT));
        out.push_str(INDENT);
        out.push_str(&member_line(member));
        out.push('\n');
    }
    out.push_str("}\n");
}

fn member_line(member: &ResolvedMember) -> String {
    let name = &member.name;
    match &member.kind {
        MemberKind::Constructor { params } => format!("constructor({})", params),
        MemberKind::Method {
            return_type,
            params,
            is_static,
        } => {
            let prefix = if *is_static { "static " } else { "" };
            format!("{}{}({}): {}", prefix, name, params, return_type)
        }
        MemberKind::Field { ty } => match ty {
            FieldType::Declared(ty) => format!("{}: {}", name, ty),
            FieldType::Unknown => format!("{}: any", name),
            FieldType::Accessor { params } => {
                format!("{}: (({}) => {{}}) | boolean", name, params)
            }
        },
    }
}

/// `/** ... */` block, one doc line per line, or nothing for no docs.
fn doc_block(docs: &[String], indent: &str) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let mut out = format!("{}/**\n", indent);
    for line in docs {
        out.push_str(indent);
        out.push_str(&line.replace("*/", "*\\/"));
        out.push('\n');
    }
    out.push_str(&format!("{} */\n", indent));
    out
}

fn push_block(out: &mut String, block: &str) {
    out.push_str(block);
    if !block.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{binding, scan_header, usertype, CorpusBuilder};
    use crate::resolve::resolve;

    fn render(surface: &Surface) -> String {
        TypescriptRenderer::new(RenderOptions {
            globals: vec!["players".to_string()],
            ..Default::default()
        })
        .render(surface)
        .unwrap()
    }

    fn surface_from(header: &str, source: &str) -> Surface {
        let mut builder = CorpusBuilder::new();
        builder.add_header("test.hpp", scan_header(header, false));
        let patterns = binding::BindingPatterns::new("lua").unwrap();
        builder.add_bindings("test.cpp", binding::scan_bindings(source, &patterns));
        builder.add_usertypes("test.cpp", usertype::scan_usertypes(&usertype::flatten(source)));
        let corpus = builder.finish();
        let types = resolve(&corpus);
        Surface { corpus, types }
    }

    #[test]
    fn end_to_end_class() {
        let surface = surface_from(
            "struct Foo { int bar(); };\n",
            "lua.new_usertype<Foo>(\"Foo\", \"bar\", &Foo::bar);\n",
        );
        let out = render(&surface);
        assert!(out.contains("declare class Foo {\n    bar(): number\n}"), "{}", out);
    }

    #[test]
    fn sections_in_order() {
        let out = render(&Surface::default());
        let order = ["@noSelfInFile", "//## Functions", "//## Types", "//## Enums", "declare class Logic", "//## Aliases"];
        let positions: Vec<usize> = order.iter().map(|s| out.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[test]
    fn rpc_signatures_preferred() {
        let surface = surface_from(
            "/// Spawns\nint spawn_entity(ENT_TYPE type, float x, float y);\n",
            "lua[\"spawn\"] = spawn_entity;\n",
        );
        let out = render(&surface);
        assert!(out.contains(
            "/**\nSpawns\n */\ndeclare function spawn(type: ENT_TYPE, x: number, y: number): number\n"
        ), "{}", out);
    }

    #[test]
    fn lambda_signature_fallback() {
        let surface = surface_from("", "lua[\"is_ok\"] = [](int uid) -> bool {\n");
        let out = render(&surface);
        assert!(out.contains("declare function is_ok(uid: number): boolean\n"), "{}", out);
    }

    #[test]
    fn skipped_functions() {
        let source = "\
/// Deprecated
lua[\"old\"] = old_fn;
/// NoDoc
lua[\"hidden\"] = hidden_fn;
lua[\"on_frame\"] = frame;
lua[\"players\"] = get_players;
lua[\"tick\"];
lua[\"tick\"] = tick_fn;
lua[\"kept\"] = kept_fn;
";
        let out = render(&surface_from("", source));
        for name in ["old", "hidden", "on_frame", "players", "tick"] {
            assert!(!out.contains(&format!("declare function {}(", name)), "{} leaked", name);
        }
        assert!(out.contains("declare function kept(): void"));
    }

    #[test]
    fn overload_wrapper_uses_each_rpc_function() {
        let surface = surface_from(
            "void draw_a(int x);\nvoid draw_b(float x, float y);\n",
            "lua[\"draw\"] = sol::overload(draw_a, draw_b);\n",
        );
        let out = render(&surface);
        assert!(out.contains("declare function draw(x: number): void"));
        assert!(out.contains("declare function draw(x: number, y: number): void"));
    }

    #[test]
    fn member_lines() {
        let ty = ExposedType {
            script_name: "Arrow".to_string(),
            native_class: "Arrow".to_string(),
            bases: vec!["Entity".to_string(), "Movable".to_string()],
            members: vec![
                ResolvedMember {
                    name: "constructor".to_string(),
                    kind: MemberKind::Constructor { params: "x: number".to_string() },
                    docs: Vec::new(),
                },
                ResolvedMember {
                    name: "white".to_string(),
                    kind: MemberKind::Method {
                        return_type: "Color".to_string(),
                        params: String::new(),
                        is_static: true,
                    },
                    docs: vec!["Doc */ here".to_string()],
                },
                ResolvedMember {
                    name: "is_poisoned".to_string(),
                    kind: MemberKind::Field { ty: FieldType::Accessor { params: String::new() } },
                    docs: Vec::new(),
                },
                ResolvedMember {
                    name: "mystery".to_string(),
                    kind: MemberKind::Field { ty: FieldType::Unknown },
                    docs: Vec::new(),
                },
            ],
            docs: Vec::new(),
        };
        let mut out = String::new();
        render_class(&mut out, &ty);
        assert_eq!(
            out,
            "declare class Arrow extends Movable {\n    constructor(x: number)\n    /**\n    Doc *\\/ here\n     */\n    static white(): Color\n    is_poisoned: (() => {}) | boolean\n    mystery: any\n}\n"
        );
    }

    #[test]
    fn enums_and_aliases() {
        let mut surface = Surface::default();
        surface.corpus.enums.push(EnumBlock {
            name: "LAYER".to_string(),
            body: "  FRONT = 0,\n  BACK = 1".to_string(),
        });
        surface.corpus.aliases.insert_if_absent(
            "CallbackId",
            Alias { name: "CallbackId".to_string(), ty: "number".to_string() },
        );
        let out = render(&surface);
        assert!(out.contains("declare enum LAYER {\n  FRONT = 0,\n  BACK = 1\n}\n"));
        assert!(out.contains("declare type CallbackId = number\n"));
    }

    #[test]
    fn overridden_blocks() {
        let renderer = TypescriptRenderer::new(RenderOptions {
            preamble: Some("// custom preamble".to_string()),
            supplement: Some("declare type Extra = any".to_string()),
            globals: Vec::new(),
        });
        let out = renderer.render(&Surface::default()).unwrap();
        assert!(out.starts_with("// custom preamble\n"));
        assert!(out.contains("declare type Extra = any\n"));
        assert!(!out.contains("declare class Logic"));
    }
}
