//! Validate configuration, mapping and template documents.

use std::path::{Path, PathBuf};

use handctl_common::config::{config_file_path, AppConfig};
use handctl_hand_model::gesture::{GestureSymbol, STATIC_RULES};
use handctl_hand_model::mapping::{Action, MappingSnapshot};

use super::document_paths;

pub fn run(
    config: Option<PathBuf>,
    mapping: Option<PathBuf>,
    templates: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("handctl Document Check");
    println!("{}", "=".repeat(50));

    let mut issues = 0usize;

    let config_path = config.unwrap_or_else(config_file_path);
    let app_config = if config_path.exists() {
        match AppConfig::load_from(&config_path) {
            Ok(c) => {
                println!("[OK] Config: {}", config_path.display());
                c
            }
            Err(e) => {
                println!("[ERR] Config {}: {e}", config_path.display());
                issues += 1;
                AppConfig::default()
            }
        }
    } else {
        println!("[--] Config: {} not found, using defaults", config_path.display());
        AppConfig::default()
    };

    let (mapping_path, templates_path) = document_paths(&app_config, mapping, templates);
    let snapshot = match MappingSnapshot::load(&mapping_path, &templates_path) {
        Ok(snapshot) => {
            report_presence("Mapping", &mapping_path);
            report_presence("Templates", &templates_path);
            snapshot
        }
        Err(e) => {
            println!("[ERR] {e}");
            println!();
            println!("1 document could not be loaded.");
            return Ok(());
        }
    };

    issues += check_mapping(&snapshot);
    issues += check_templates(&snapshot);

    println!();
    if issues == 0 {
        println!("All documents are valid.");
    } else {
        println!("{issues} issue(s) found. See above.");
    }

    Ok(())
}

fn report_presence(label: &str, path: &Path) {
    if path.exists() {
        println!("[OK] {label}: {}", path.display());
    } else {
        println!("[--] {label}: {} not found, treated as empty", path.display());
    }
}

/// Flag overrides whose symbol is neither built in nor a known template, and
/// overrides naming an action that will be sent as a raw shortcut.
fn check_mapping(snapshot: &MappingSnapshot) -> usize {
    let mut issues = 0;
    for (name, action) in snapshot.mapping.overrides() {
        let symbol = GestureSymbol::from_name(name);
        if let GestureSymbol::Custom(custom) = &symbol {
            if !snapshot.templates.contains_key(custom) {
                println!("[WARN] Mapping: '{name}' is not a built-in gesture or a template");
                issues += 1;
                continue;
            }
        }
        if let Action::Shortcut(combo) = Action::parse(action) {
            println!("[INFO] Mapping: {name} sends shortcut '{combo}'");
        }
    }
    issues
}

fn check_templates(snapshot: &MappingSnapshot) -> usize {
    let mut issues = 0;
    for (name, template) in &snapshot.templates {
        if template.is_unconstrained() {
            println!("[WARN] Template '{name}' has no fields and matches every hand");
            issues += 1;
            continue;
        }
        if let Some(pattern) = &template.finger_pattern {
            let shadowing = STATIC_RULES
                .iter()
                .find(|r| r.pattern == pattern.as_str() && r.discriminator.is_none());
            if let Some(rule) = shadowing {
                println!(
                    "[WARN] Template '{name}' pattern {pattern} is shadowed by {}",
                    rule.gesture.name()
                );
                issues += 1;
            }
        }
        if !matches!(GestureSymbol::from_name(name), GestureSymbol::Custom(_)) {
            println!("[WARN] Template '{name}' shares its name with a built-in gesture");
            issues += 1;
        }
        if snapshot.mapping.resolve(&GestureSymbol::Custom(name.clone())).is_none() {
            println!("[INFO] Template '{name}' has no mapped action");
        }
    }
    issues
}
