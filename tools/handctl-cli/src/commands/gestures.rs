//! List the built-in gesture registry.

use handctl_hand_model::gesture::{GestureSymbol, STATIC_RULES};

pub fn run() -> anyhow::Result<()> {
    println!("Static gestures (first match wins)");
    println!("{}", "=".repeat(60));
    for (i, rule) in STATIC_RULES.iter().enumerate() {
        let orientation = rule
            .discriminator
            .map(|d| format!("pointing {}", d.as_str()))
            .unwrap_or_else(|| "any orientation".to_string());
        println!(
            "{:>2}. {:<16} {}  {:<18} -> {}",
            i + 1,
            rule.gesture.name(),
            rule.pattern,
            orientation,
            rule.gesture.default_action()
        );
    }

    println!();
    println!("Then, when no static rule matches:");
    for symbol in GestureSymbol::builtins()
        .into_iter()
        .filter(|s| !matches!(s, GestureSymbol::Static(_)))
    {
        println!(
            "    {:<16} -> {}",
            symbol.name(),
            symbol.default_action().unwrap_or("-")
        );
    }
    println!("    custom templates, in name order, after OK_SIGN and before swipes");

    println!();
    println!("Finger pattern order: thumb, index, middle, ring, pinky (1 = extended).");
    Ok(())
}
