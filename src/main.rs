//! soldecl — generate TypeScript declarations for a sol2 scripting API.
//!
//! Reads the C++ headers and binding sources listed in a manifest, joins the
//! script registrations against the native declarations and writes one
//! ambient declaration file:
//!
//! ```text
//! soldecl -m soldecl.toml -o spel2.d.ts
//! ```

mod config;
mod model;
mod parser;
mod patch;
mod render;
mod resolve;
mod translate;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "soldecl",
    about = "Generate TypeScript declarations from sol2 bindings and C++ headers"
)]
struct Cli {
    /// Project manifest
    #[arg(short = 'm', long, default_value = "soldecl.toml")]
    manifest: PathBuf,

    /// Output file (overrides the manifest)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: typescript (default), json
    #[arg(short = 'f', long, default_value = "typescript")]
    format: String,

    /// Skip the patch table
    #[arg(long)]
    no_patch: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(&cli)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_env("SOLDECL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let project = config::Project::from_file(&cli.manifest)?;
    let manifest = &project.manifest;

    let options = render::RenderOptions {
        preamble: project.read_optional(manifest.preamble.as_deref())?,
        supplement: project.read_optional(manifest.supplement.as_deref())?,
        globals: manifest.globals.clone(),
    };
    let renderer = render::create_renderer(&cli.format, options)?;

    let corpus = build_corpus(&project)?;
    let types = resolve::resolve(&corpus);
    let surface = model::Surface { corpus, types };

    let mut output = renderer.render(&surface)?;
    if renderer.patchable() && !cli.no_patch {
        if let Some(relative) = manifest.patches.as_deref() {
            let patches = patch::load(&project.resolve(relative))?;
            tracing::info!(count = patches.len(), "applying patches");
            output = patch::apply(&output, &patches);
        }
    }

    let out_path = match (&cli.output, &manifest.output) {
        (Some(path), _) => path.clone(),
        (None, Some(relative)) => project.resolve(relative),
        (None, None) => project.resolve(&format!("soldecl.{}", renderer.file_extension())),
    };
    write_atomic(&out_path, &output)?;
    tracing::info!(path = %out_path.display(), "wrote declarations");
    Ok(())
}

/// Scan every configured file in manifest order and merge the results.
fn build_corpus(project: &config::Project) -> Result<model::Corpus> {
    let manifest = &project.manifest;
    let mut builder = parser::CorpusBuilder::new();

    let headers = project.header_paths()?;
    for path in &headers {
        let content = read_source(path)?;
        let scan = parser::scan_header(&content, project.is_rpc_header(path));
        tracing::debug!(
            file = %path.display(),
            rpc = scan.rpc.len(),
            classes = scan.classes.len(),
            "scanned header"
        );
        builder.add_header(&path.to_string_lossy(), scan);
    }
    tracing::info!(count = headers.len(), "scanned headers");

    let patterns = parser::binding::BindingPatterns::new(&manifest.script_table)?;
    let sources = project.source_paths()?;
    for path in &sources {
        let content = read_source(path)?;
        let source = path.to_string_lossy();
        let scan = parser::binding::scan_bindings(&content, &patterns);
        tracing::debug!(
            file = %path.display(),
            functions = scan.functions.len(),
            events = scan.events.len(),
            "scanned bindings"
        );
        builder.add_bindings(&source, scan);

        let flat = parser::usertype::flatten(&content);
        builder.add_usertypes(&source, parser::usertype::scan_usertypes(&flat));
        builder.add_libraries(parser::usertype::scan_libraries(&flat));
    }
    tracing::info!(count = sources.len(), "scanned binding sources");

    if let Some(relative) = manifest.aliases.as_deref() {
        let content = read_source(&project.resolve(relative))?;
        builder.add_aliases(parser::alias::scan_aliases(&content));
    }
    if let Some(relative) = manifest.enums.as_deref() {
        let content = read_source(&project.resolve(relative))?;
        builder.add_enums(parser::enums::scan_enums(&content));
    }

    Ok(builder.finish())
}

/// Read a source file, tolerating bytes that are not valid UTF-8.
fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write through a temporary file in the destination directory, then
/// rename it over the destination.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
