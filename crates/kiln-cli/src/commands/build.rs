//! `kiln build`.

use std::path::Path;
use std::time::Instant;

use kiln_build::{BuildContext, BuildOrchestrator, BuildOutcome, PresetInput, PresetRegistry};

use crate::cli::BuildArgs;
use crate::commands::utils::{load_user_config, project_root};
use crate::error::Result;
use crate::settings::BuildSettings;
use crate::ui;

/// Run the build pipeline for the project.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start = Instant::now();
    let settings = BuildSettings::load(&args)?;

    let root = project_root(settings.cwd.as_deref())?;
    let user = load_user_config(&root, settings.config.as_deref())?;
    if user.is_none() {
        ui::info("No kiln configuration found; one will be created from the preset");
    }

    let ctx = context(&root, &settings);
    let input = settings.preset.clone().map(PresetInput::from);

    let mut orchestrator = BuildOrchestrator::new(PresetRegistry::builtin());
    let spinner = ui::Spinner::new("Building...");
    let outcome = match orchestrator.run(input, user, &ctx).await {
        Ok(outcome) => {
            spinner.clear();
            outcome
        }
        Err(err) => {
            spinner.fail(&format!("Build failed while {}", err.phase.activity()));
            return Err(err.into());
        }
    };

    report(&outcome, &root);
    ui::success(&format!(
        "Built {} with {} in {}",
        outcome.preset,
        outcome.bundler,
        ui::format_duration(start.elapsed())
    ));
    Ok(())
}

pub(crate) fn context(root: &Path, settings: &BuildSettings) -> BuildContext {
    let mut ctx = BuildContext::new(root)
        .production(settings.production)
        .firewall(settings.firewall);
    if let Some(entry) = &settings.entry {
        ctx = ctx.entry(entry.clone());
    }
    if let Some(builder) = &settings.builder {
        ctx = ctx.builder(builder.clone());
    }
    if let Some(config) = &settings.config {
        ctx = ctx.config_path(config.clone());
    }
    if let Some(output) = &settings.output {
        ctx = ctx.output(output.clone());
    }
    if let Some(manifest) = &settings.manifest {
        ctx = ctx.manifest_path(manifest.clone());
    }
    ctx
}

fn report(outcome: &BuildOutcome, root: &Path) {
    let shown = |path: &Path| path.strip_prefix(root).unwrap_or(path).display().to_string();

    if let Some(path) = &outcome.bootstrapped {
        ui::info(&format!("Created {}", shown(path)));
    }
    ui::info(&format!("Worker: {}", shown(&outcome.output)));
    if let Ok(meta) = std::fs::metadata(&outcome.output) {
        ui::debug(&format!("Worker size: {}", ui::format_size(meta.len())));
    }
    ui::info(&format!(
        "Manifest: {} ({} request, {} response rules)",
        shown(&outcome.manifest_path),
        outcome.manifest.rules.request.len(),
        outcome.manifest.rules.response.len()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn context_carries_every_setting() {
        let settings = BuildSettings {
            production: true,
            firewall: true,
            entry: Some("src/main.js".into()),
            builder: Some("esbuild".into()),
            config: Some(PathBuf::from("custom.json")),
            output: Some(PathBuf::from("out/worker.js")),
            ..BuildSettings::default()
        };
        let ctx = context(Path::new("/srv/app"), &settings);

        assert!(ctx.production);
        assert_eq!(ctx.event, kiln_build::WorkerEvent::Firewall);
        assert_eq!(ctx.entry.as_deref(), Some("src/main.js"));
        assert_eq!(ctx.builder.as_deref(), Some("esbuild"));
        assert_eq!(ctx.output_path(), PathBuf::from("/srv/app/out/worker.js"));
        assert_eq!(ctx.config_path, Some(PathBuf::from("custom.json")));
    }
}
