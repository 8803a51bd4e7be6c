pub mod check;
pub mod gestures;
pub mod init;
pub mod replay;
pub mod synth;

use std::path::{Path, PathBuf};

use anyhow::Context;
use handctl_common::config::AppConfig;

/// Config from `path`, or from the standard location when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

/// Mapping and template paths: explicit arguments win over the config.
pub(crate) fn document_paths(
    config: &AppConfig,
    mapping: Option<PathBuf>,
    templates: Option<PathBuf>,
) -> (PathBuf, PathBuf) {
    (
        mapping.unwrap_or_else(|| config.files.mapping.clone()),
        templates.unwrap_or_else(|| config.files.templates.clone()),
    )
}
