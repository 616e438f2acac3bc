//! Shared configuration loader for docmark.
//!
//! `defaults/docmark.default.toml` is embedded into every build so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`DocmarkConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use docmark_babel::{ConvertOptions, MetadataMode};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/docmark.default.toml");

/// Top-level configuration consumed by docmark applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DocmarkConfig {
    pub metadata: MetadataConfig,
    pub layout: LayoutConfig,
    pub markdown: MarkdownConfig,
}

/// Side-channel record placement.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    pub mode: MetadataMode,
    pub companion_suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub images_dir: String,
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownConfig {
    pub cell_line_break: String,
}

impl From<&DocmarkConfig> for ConvertOptions {
    fn from(config: &DocmarkConfig) -> Self {
        ConvertOptions {
            metadata: config.metadata.mode,
            companion_suffix: config.metadata.companion_suffix.clone(),
            images_dir: config.layout.images_dir.clone(),
            extension: config.layout.extension.clone(),
            cell_line_break: config.markdown.cell_line_break.clone(),
        }
    }
}

impl From<DocmarkConfig> for ConvertOptions {
    fn from(config: DocmarkConfig) -> Self {
        ConvertOptions::from(&config)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `("metadata.mode", "companion")`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<DocmarkConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DocmarkConfig, ConfigError> {
    Loader::new().build()
}
