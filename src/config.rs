//! Export configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where binary payloads (geometry and images) end up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputMode {
    /// Everything packed into one buffer, framed as a GLB binary chunk.
    Binary,
    /// Images and geometry embedded as base64 data URIs.
    Inline,
    /// Images and geometry written as files next to the document.
    External {
        /// Directory the files are written to.
        directory: PathBuf,
        /// File stem: `<stem>.bin` for geometry, `<stem>_<n>.png` for images.
        stem: String,
    },
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Binary
    }
}

/// Main export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output strategy, fixed for the whole build.
    #[serde(default)]
    pub output_mode: OutputMode,
    /// Written to `asset.generator`.
    #[serde(default = "default_generator")]
    pub generator: String,
}

fn default_generator() -> String {
    concat!("scene-gltf ", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Binary,
            generator: default_generator(),
        }
    }
}

impl ExportConfig {
    /// Config that embeds everything as data URIs.
    pub fn inline() -> Self {
        Self::default().with_output_mode(OutputMode::Inline)
    }

    /// Config that writes `<stem>.bin` and image files into `directory`.
    pub fn external(directory: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self::default().with_output_mode(OutputMode::External {
            directory: directory.into(),
            stem: stem.into(),
        })
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Check if this config packs everything into a GLB container.
    pub fn is_binary(&self) -> bool {
        matches!(self.output_mode, OutputMode::Binary)
    }
}
