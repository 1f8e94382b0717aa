//! JSON renderer — structured dump of the resolved surface for tooling.

use crate::model::Surface;
use crate::render::Renderer;
use anyhow::{Context, Result};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, surface: &Surface) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(surface).context("failed to serialize surface")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
