use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shipmap",
    about = "Debug-ID injection and source map upload for build artifacts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inject debug IDs into built chunks and their source maps
    Inject(InjectArgs),
    /// Stage injected chunks and source maps and upload them
    Upload(UploadArgs),
    /// Inject, upload, run release steps, then delete configured files
    Process(UploadArgs),
}

#[derive(Args)]
pub struct InjectArgs {
    /// Files, directories, or glob patterns
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Files, directories, or glob patterns
    #[arg(required = true)]
    pub paths: Vec<String>,
    #[arg(long)]
    pub release: Option<String>,
    #[arg(long)]
    pub dist: Option<String>,
    /// Copy bundles into this directory instead of running a release CLI
    #[arg(long, conflicts_with = "command")]
    pub out_dir: Option<PathBuf>,
    /// Release CLI executable to drive
    #[arg(long)]
    pub command: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload() {
        let cli = Cli::try_parse_from([
            "shipmap", "-v", "--config", "shipmap.toml", "upload", "dist", "--release", "r1", "--out-dir", "out",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("shipmap.toml")));
        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.paths, vec!["dist"]);
        assert_eq!(args.release.as_deref(), Some("r1"));
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn out_dir_conflicts_with_command() {
        let parsed = Cli::try_parse_from([
            "shipmap", "upload", "dist", "--out-dir", "out", "--command", "release-cli",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn inject_requires_paths() {
        assert!(Cli::try_parse_from(["shipmap", "inject"]).is_err());
    }
}
