//! `kiln manifest`: compile the routing manifest or the platform payload
//! without bundling.

use std::path::{Path, PathBuf};

use kiln_build::{PresetInput, PresetRegistry, PresetResolver};
use kiln_config::{KilnConfig, merge_with_user_overrides};
use kiln_manifest::{compile, generate_payload, manifest_path, to_pretty_json, write_manifest, write_payload};

use crate::cli::ManifestArgs;
use crate::commands::utils::{load_user_config, project_root, resolve_path};
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: ManifestArgs) -> Result<()> {
    let root = project_root(args.cwd.as_deref())?;
    let user = load_user_config(&root, args.config.as_deref())?.ok_or_else(|| {
        CliError::Custom(
            "no kiln configuration found\n\nHint: create kiln.config.json, run `kiln build` once, or pass --config"
                .to_string(),
        )
    })?;
    let config = effective_config(&PresetRegistry::builtin(), user)?;

    if args.platform {
        let payload = generate_payload(&config)?;
        match &args.out {
            Some(out) => {
                let path = resolve_path(out, &root);
                write_payload(&payload, &path)?;
                ui::success(&format!("Platform payload written to {}", shown(&path, &root)));
            }
            None => print!("{}", to_pretty_json(&payload)?),
        }
        return Ok(());
    }

    let manifest = compile(&config)?;
    let path = manifest_path(&root, args.out.as_deref());
    write_manifest(&manifest, &path)?;
    ui::success(&format!(
        "Manifest written to {} ({} request, {} response rules)",
        shown(&path, &root),
        manifest.rules.request.len(),
        manifest.rules.response.len()
    ));
    Ok(())
}

/// Apply the configured preset's defaults under the user's configuration,
/// the way a build would.
///
/// # Errors
///
/// An unregistered `build.preset` fails with the same unknown-preset error a
/// build reports.
pub fn effective_config(registry: &PresetRegistry, user: KilnConfig) -> Result<KilnConfig> {
    let Some(name) = user.preset_name().map(str::to_string) else {
        return Ok(user);
    };
    let preset = PresetResolver::new(registry).resolve(PresetInput::from(name))?;
    tracing::debug!(preset = %preset.name(), "applying preset defaults");
    Ok(merge_with_user_overrides(&preset.config, Some(&user)))
}

fn shown(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
