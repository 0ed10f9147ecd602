//! `kiln presets`.

use kiln_build::PresetRegistry;
use owo_colors::OwoColorize;

use crate::cli::PresetsArgs;
use crate::error::Result;
use crate::ui;

pub fn execute(args: PresetsArgs) -> Result<()> {
    let registry = PresetRegistry::builtin();

    if args.json {
        let presets: Vec<_> = registry.iter().map(|preset| &preset.metadata).collect();
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    let width = registry.names().iter().map(|name| name.len()).max().unwrap_or(0);
    for preset in registry.iter() {
        let name = format!("{:width$}", preset.name());
        if ui::colors_enabled() {
            println!("  {}  {}", name.bold(), preset.metadata.kind.dimmed());
        } else {
            println!("  {}  {}", name, preset.metadata.kind);
        }
    }
    Ok(())
}
