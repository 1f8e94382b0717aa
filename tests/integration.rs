use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_soldecl")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Run the generator over the fixture project and return the output text.
fn generate(extra: &[&str]) -> String {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.d.ts");
    cmd()
        .arg("-m")
        .arg(fixture_path("project/soldecl.toml"))
        .arg("-o")
        .arg(&out)
        .args(extra)
        .assert()
        .success();
    fs::read_to_string(&out).unwrap()
}

// -- declaration output --

#[test]
fn preamble_comes_first() {
    let output = generate(&[]);
    assert!(output.starts_with("/** @noSelfInFile */\n"));
    assert!(output.contains("declare const players: Array<Player>;"));
}

#[test]
fn functions_from_rpc_header() {
    let output = generate(&[]);
    assert!(output.contains(
        "/**\nShort for spawn_entity\n */\ndeclare function spawn(entity_type: ENT_TYPE, x: number, y: number, layer: LAYER, vx: number, vy: number): number\n"
    ));
    assert!(output.contains("declare function get_entity(uid: number): Entity\n"));
    assert!(output.contains(
        "declare function get_position(uid: number): LuaMultiReturn<[number, number, number]>\n"
    ));
}

#[test]
fn functions_from_lambdas() {
    let output = generate(&[]);
    assert!(output.contains(
        "/**\nReturns true when the level is loaded\n */\ndeclare function is_loaded(): boolean\n"
    ));
}

#[test]
fn skipped_bindings() {
    let output = generate(&[]);
    assert!(!output.contains("declare function get_entities("));
    assert!(!output.contains("declare function on_frame("));
    assert!(!output.contains("declare function players("));
    assert_eq!(output.matches("declare function spawn(").count(), 1);
}

#[test]
fn class_with_docs_and_members() {
    let output = generate(&[]);
    let expected = "\
/**
Base of every object
 */
declare class Entity {
    /**
    Unique id
     */
    uid: number
    x: number
    y: number
    layer: number
    /**
    Remove from the level
     */
    destroy(): void
    position(): LuaMultiReturn<[number, number]>
    overlaps_with(other: Entity): boolean
}
";
    assert!(output.contains(expected), "{}", output);
}

#[test]
fn inheritance_and_union_members() {
    let output = generate(&[]);
    let expected = "\
declare class Movable extends Entity {
    velocityx: number
    r: number
    is_poisoned: boolean
    poison(frames: number): void
}
";
    assert!(output.contains(expected), "{}", output);
}

#[test]
fn constructors_and_static_methods() {
    let output = generate(&[]);
    let expected = "\
declare class Color {
    constructor()
    constructor(Color: Color)
    constructor(r_: number, g_: number, b_: number, a_: number)
    r: number
    a: number
    static white(): Color
}
";
    assert!(output.contains(expected), "{}", output);
}

#[test]
fn enums_skip_internal_blocks() {
    let output = generate(&[]);
    assert!(output.contains("declare enum LAYER {\n  FRONT = 0,\n  BACK = 1\n}\n"));
    assert!(output.contains("declare enum THEME {"));
    assert!(!output.contains("INTERNAL"));
}

#[test]
fn aliases_at_the_end() {
    let output = generate(&[]);
    let aliases = output.find("//## Aliases").unwrap();
    assert!(output[aliases..].contains("declare type CallbackId = number\n"));
    assert!(output[aliases..].contains("declare type Flags = number\n"));
    assert!(!output.contains("uColor"));
}

#[test]
fn section_order() {
    let output = generate(&[]);
    let positions: Vec<usize> = ["//## Functions", "//## Types", "//## Enums", "//## Aliases"]
        .iter()
        .map(|s| output.find(s).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

// -- patch stage --

#[test]
fn no_patch_keeps_accessor_quirk() {
    let output = generate(&["--no-patch"]);
    assert!(output.contains("    is_poisoned: (() => {}) | boolean\n"));
}

#[test]
fn unmatched_patch_is_reported() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("-m")
        .arg(fixture_path("project/soldecl.toml"))
        .arg("-o")
        .arg(dir.path().join("out.d.ts"))
        .assert()
        .success()
        .stderr(predicate::str::contains("patch matched nothing"));
}

// -- diagnostics --

#[test]
fn missing_class_record_is_a_warning() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("-m")
        .arg(fixture_path("project/soldecl.toml"))
        .arg("-o")
        .arg(dir.path().join("out.d.ts"))
        .assert()
        .success()
        .stderr(predicate::str::contains("no class record"))
        .stderr(predicate::str::contains("Ghost"));
}

#[test]
fn missing_manifest_fails() {
    cmd()
        .arg("-m")
        .arg("/nonexistent/soldecl.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read manifest"));
}

#[test]
fn unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("-m")
        .arg(fixture_path("project/soldecl.toml"))
        .arg("-o")
        .arg(dir.path().join("out.txt"))
        .arg("-f")
        .arg("markdown")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("soldecl.toml");
    fs::write(&manifest, "headers = [\"missing.hpp\"]\n").unwrap();
    cmd()
        .arg("-m")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.hpp"));
}

// -- json format --

#[test]
fn json_dump_of_surface() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("surface.json");
    cmd()
        .arg("-m")
        .arg(fixture_path("project/soldecl.toml"))
        .arg("-o")
        .arg(&out)
        .arg("-f")
        .arg("json")
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["functions"]["spawn"]["native"], "spawn_entity");
    assert_eq!(value["libraries"], serde_json::json!(["base", "math"]));
    assert_eq!(value["casts"], serde_json::json!(["as_movable"]));
    let types: Vec<&str> = value["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["script_name"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["Entity", "Movable", "Color"]);
}

// -- manifest handling --

#[test]
fn default_output_next_to_manifest() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("foo.hpp"), "struct Foo { int bar(); };\n").unwrap();
    fs::write(
        dir.path().join("bind.cpp"),
        "lua.new_usertype<Foo>(\"Foo\", \"bar\", &Foo::bar);\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("soldecl.toml"),
        "headers = [\"*.hpp\"]\nsources = [\"*.cpp\"]\n",
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("soldecl.d.ts")).unwrap();
    assert!(output.contains("declare class Foo {\n    bar(): number\n}"));
}

#[test]
fn custom_preamble_and_script_table() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("api.hpp"), "/// Says hi\nvoid greet(const std::string& who);\n").unwrap();
    fs::write(dir.path().join("bind.cpp"), "state[\"greet\"] = greet;\n").unwrap();
    fs::write(dir.path().join("preamble.d.ts"), "/** custom */\n").unwrap();
    fs::write(
        dir.path().join("soldecl.toml"),
        "output = \"api.d.ts\"\nheaders = [\"api.hpp\"]\nsources = [\"bind.cpp\"]\nrpc_header = \"api.hpp\"\nscript_table = \"state\"\npreamble = \"preamble.d.ts\"\n",
    )
    .unwrap();

    cmd()
        .arg("--manifest")
        .arg(dir.path().join("soldecl.toml"))
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("api.d.ts")).unwrap();
    assert!(output.starts_with("/** custom */\n"));
    assert!(output.contains("/**\nSays hi\n */\ndeclare function greet(who: string): void\n"));
}

#[test]
fn const_qualified_rpc_signatures() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("script.hpp"),
        "void print(const char* message);\nconst Color& get_color(int uid);\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("bind.cpp"),
        "lua[\"print\"] = print;\nlua[\"get_color\"] = get_color;\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("soldecl.toml"),
        "headers = [\"script.hpp\"]\nsources = [\"bind.cpp\"]\n",
    )
    .unwrap();

    cmd()
        .arg("-m")
        .arg(dir.path().join("soldecl.toml"))
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("soldecl.d.ts")).unwrap();
    assert!(output.contains("declare function print(message: string): void\n"));
    assert!(output.contains("declare function get_color(uid: number): Color\n"));
}
