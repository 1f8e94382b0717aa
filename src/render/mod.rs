//! Renderer module — trait-based format dispatch.

pub mod json;
pub mod typescript;

use crate::model::Surface;
use anyhow::{anyhow, Result};

/// Trait for rendering the resolved surface into a specific output format.
pub trait Renderer {
    fn render(&self, surface: &Surface) -> Result<String>;
    fn file_extension(&self) -> &str;
    /// Whether the patch stage applies to this format's output.
    fn patchable(&self) -> bool {
        false
    }
}

/// Hand-authored blocks and names the TypeScript renderer needs.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Replaces the built-in preamble when set.
    pub preamble: Option<String>,
    /// Replaces the built-in supplemental declarations when set.
    pub supplement: Option<String>,
    /// Ambient globals; bindings with these names are not functions.
    pub globals: Vec<String>,
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str, options: RenderOptions) -> Result<Box<dyn Renderer>> {
    match format {
        "typescript" | "ts" => Ok(Box::new(typescript::TypescriptRenderer::new(options))),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use typescript or json", format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats() {
        let ts = create_renderer("typescript", RenderOptions::default()).unwrap();
        assert_eq!(ts.file_extension(), "d.ts");
        assert!(ts.patchable());
        let json = create_renderer("json", RenderOptions::default()).unwrap();
        assert_eq!(json.file_extension(), "json");
        assert!(!json.patchable());
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = create_renderer("markdown", RenderOptions::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown format"));
    }
}
