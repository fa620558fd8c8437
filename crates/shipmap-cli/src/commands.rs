use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use shipmap_upload::{
    BuildPluginManager, CommandTransport, DirectoryTransport, InjectReport, ReleaseApi, Transport, UploadConfig,
    UploadReport,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => UploadConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => UploadConfig::default(),
    };
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;

    match cli.command {
        Command::Inject(args) => runtime.block_on(cmd_inject(config, args)),
        Command::Upload(args) => runtime.block_on(cmd_upload(config, args)),
        Command::Process(args) => runtime.block_on(cmd_process(config, args)),
    }
}

async fn cmd_inject(config: UploadConfig, args: InjectArgs) -> anyhow::Result<()> {
    // Injection never reaches the transport.
    let manager = BuildPluginManager::new(config, Arc::new(DirectoryTransport::new(".")));
    let report = manager.inject_debug_ids(&args.paths).await?;
    print_inject(&report);
    Ok(())
}

async fn cmd_upload(config: UploadConfig, args: UploadArgs) -> anyhow::Result<()> {
    let manager = build_manager(config, &args)?;
    let report = manager.upload_sourcemaps(&args.paths).await?;
    print_upload(&report);
    Ok(())
}

async fn cmd_process(config: UploadConfig, args: UploadArgs) -> anyhow::Result<()> {
    let manager = build_manager(config, &args)?;

    let injected = manager.inject_debug_ids(&args.paths).await?;
    print_inject(&injected);

    let report = manager.upload_sourcemaps(&args.paths).await?;
    print_upload(&report);

    let steps = manager.create_release().await?;
    for step in &steps {
        println!("  {} release {}", "✓".green(), step.to_string().cyan());
    }

    let deleted = manager.delete_artifacts().await?;
    if !deleted.deleted.is_empty() || !deleted.failed.is_empty() {
        println!(
            "{} Deleted {} file(s){}",
            "✓".green(),
            deleted.deleted.len().to_string().bold(),
            failed_suffix(deleted.failed.len())
        );
    }
    Ok(())
}

fn build_manager(mut config: UploadConfig, args: &UploadArgs) -> anyhow::Result<BuildPluginManager> {
    if let Some(release) = &args.release {
        config.release.name = Some(release.clone());
    }
    if let Some(dist) = &args.dist {
        config.release.dist = Some(dist.clone());
    }

    match (&args.out_dir, &args.command) {
        (Some(out_dir), _) => Ok(BuildPluginManager::new(config, Arc::new(DirectoryTransport::new(out_dir)))),
        (None, Some(program)) => {
            let cli = Arc::new(CommandTransport::new(program));
            let transport: Arc<dyn Transport> = cli.clone();
            let releases: Arc<dyn ReleaseApi> = cli;
            Ok(BuildPluginManager::new(config, transport).with_release_api(releases))
        }
        (None, None) => bail!("either --out-dir or --command is required"),
    }
}

fn print_inject(report: &InjectReport) {
    println!(
        "{} Injected {} chunk(s), {} already injected, {} map(s) updated{}",
        "✓".green().bold(),
        report.injected.to_string().bold(),
        report.already_injected,
        report.maps,
        failed_suffix(report.failed)
    );
}

fn print_upload(report: &UploadReport) {
    if report.chunks_found == 0 {
        println!("{} No chunks found.", "!".yellow().bold());
        return;
    }
    let status = if report.uploaded {
        "uploaded".green()
    } else {
        "not uploaded".red()
    };
    println!(
        "{} {} of {} chunk(s) staged with {} map(s), {} bytes, {}",
        "✓".green().bold(),
        report.prepared.len().to_string().bold(),
        report.chunks_found,
        report.maps(),
        report.staged_bytes,
        status
    );
    for (path, reason) in &report.skipped {
        println!("  {} {} ({:?})", "skipped:".yellow(), path.display(), reason);
    }
    for pair in &report.prepared {
        println!("  {} {}", pair.debug_id.to_string().cyan(), pair.source_path.display());
    }
}

fn failed_suffix(failed: usize) -> String {
    if failed == 0 {
        String::new()
    } else {
        format!(", {} failed", failed.to_string().red())
    }
}
