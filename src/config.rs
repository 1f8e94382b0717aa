//! Project manifest (`soldecl.toml`).
//!
//! Paths in the manifest are relative to the manifest's own directory.
//! `headers` and `sources` accept glob patterns.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Output file. Defaults to `soldecl.<ext>` next to the manifest.
    pub output: Option<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    /// File name of the header whose declarations form the RPC surface.
    #[serde(default = "default_rpc_header")]
    pub rpc_header: String,
    /// Identifier of the script state in binding sources.
    #[serde(default = "default_script_table")]
    pub script_table: String,
    pub aliases: Option<String>,
    pub enums: Option<String>,
    pub patches: Option<String>,
    pub preamble: Option<String>,
    pub supplement: Option<String>,
    /// Ambient globals declared by the preamble, never rendered as functions.
    #[serde(default = "default_globals")]
    pub globals: Vec<String>,
}

fn default_rpc_header() -> String {
    "script.hpp".to_string()
}

fn default_script_table() -> String {
    "lua".to_string()
}

fn default_globals() -> Vec<String> {
    [
        "players",
        "state",
        "game_manager",
        "online",
        "savegame",
        "options",
        "meta",
        "prng",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid manifest")
    }
}

/// A manifest together with the directory its paths are relative to.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest at {}", path.display()))?;
        let manifest = Manifest::parse(&content)
            .with_context(|| format!("Failed to parse manifest at {}", path.display()))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { root, manifest })
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn header_paths(&self) -> Result<Vec<PathBuf>> {
        expand_globs(&self.root, &self.manifest.headers)
    }

    pub fn source_paths(&self) -> Result<Vec<PathBuf>> {
        expand_globs(&self.root, &self.manifest.sources)
    }

    /// Whether `path` is the designated RPC header.
    pub fn is_rpc_header(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name == self.manifest.rpc_header.as_str())
    }

    /// Contents of an optional manifest file, read when configured.
    pub fn read_optional(&self, entry: Option<&str>) -> Result<Option<String>> {
        let Some(relative) = entry else {
            return Ok(None);
        };
        let path = self.resolve(relative);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(content))
    }
}

/// Expand patterns relative to `root`. Matches of one pattern are sorted;
/// the order of patterns is kept and a file listed twice appears once.
/// Plain paths pass through so that a missing file fails when read.
fn expand_globs(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let full = root.join(pattern);
        if !pattern.contains(['*', '?', '[']) {
            if !files.contains(&full) {
                files.push(full);
            }
            continue;
        }

        let full_pattern = full.to_string_lossy();
        let mut matches: Vec<PathBuf> = glob::glob(&full_pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!(pattern = %pattern, "no files matched");
        }
        matches.sort();
        for path in matches {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}
