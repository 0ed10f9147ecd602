#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn build_parses_all_overrides() {
        let cli = Cli::try_parse_from([
            "kiln",
            "build",
            "--preset",
            "react",
            "--entry",
            "src/main.js",
            "--builder",
            "esbuild",
            "--production",
            "--firewall",
            "--config",
            "custom.json",
        ])
        .unwrap();

        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.preset.as_deref(), Some("react"));
        assert_eq!(args.entry.as_deref(), Some("src/main.js"));
        assert_eq!(args.builder.as_deref(), Some("esbuild"));
        assert!(args.production);
        assert!(args.firewall);
        assert_eq!(args.config, Some(PathBuf::from("custom.json")));
    }

    #[test]
    fn build_defaults_are_empty() {
        let cli = Cli::try_parse_from(["kiln", "build"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert!(args.preset.is_none());
        assert!(!args.production);
        assert!(!args.firewall);
    }

    #[test]
    fn manifest_platform_flag() {
        let cli = Cli::try_parse_from(["kiln", "manifest", "--platform", "-o", "payload.json"]).unwrap();
        let Command::Manifest(args) = cli.command else {
            panic!("expected manifest command");
        };
        assert!(args.platform);
        assert_eq!(args.out, Some(PathBuf::from("payload.json")));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["kiln", "presets", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["kiln", "-v", "-q", "presets"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["kiln"]).is_err());
    }
}
