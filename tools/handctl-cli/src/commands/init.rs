//! Write default configuration documents.

use std::path::{Path, PathBuf};

use anyhow::Context;
use handctl_common::config::{config_dir, AppConfig};

pub fn run(output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let dir = output.unwrap_or_else(config_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    println!("Initializing handctl configuration in {}", dir.display());

    let mut config = AppConfig::default();
    config.files.mapping = dir.join("gestures.json");
    config.files.templates = dir.join("custom_gestures.json");

    let config_path = dir.join("config.json");
    if should_write(&config_path, force) {
        config.save_to(&config_path)?;
        println!("  Wrote {}", config_path.display());
    }
    for path in [&config.files.mapping, &config.files.templates] {
        if should_write(path, force) {
            std::fs::write(path, "{}\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("  Wrote {}", path.display());
        }
    }

    println!();
    println!("Edit gestures.json to remap gestures, e.g. {{\"PEACE_SIGN\": \"screenshot\"}}.");
    Ok(())
}

fn should_write(path: &Path, force: bool) -> bool {
    if path.exists() && !force {
        println!("  Kept existing {} (use --force to overwrite)", path.display());
        return false;
    }
    true
}
