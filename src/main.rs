//! ticbuild - build, package and live-reload TypeScript games for TIC-80
//!
//! Main entry point for the command line tool.
//!
//! # Commands
//!
//! - `init`: scaffold a workspace (config documents, starter sources, `build/`)
//! - `run`: build, launch the player, then rebuild and relaunch on every change
//! - `build`: build once without launching the player and exit
//!
//! # Execution Flow (`run`)
//!
//! 1. Initialize logging → console + build/logs/ticbuild.<date>
//! 2. Create a current-thread tokio runtime; all cycles run on it one at a time
//! 3. Load the configuration once to derive the watched paths
//! 4. Run the watch loop until Ctrl-C, then stop the player

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::sync::Arc;
use ticbuild::cli::{Cli, Command};
use ticbuild::services::{BuildOrchestrator, ExternalToolchain, WatchLoop, WatchSet};
use ticbuild::{
    APP_NAME, BuildConfig, CompilerConfig, ConfigManager, Metrics, ScaffoldOutcome, Scaffolder,
    ToolConfig, VERSION,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { yes } => {
            ticbuild::logging::setup_console_logging(cli.verbose)?;
            init(&cli.workspace, yes)
        }
        Command::Run { no_launch } => {
            let workspace = ticbuild::config::resolve_workspace(&cli.workspace)?;
            let _guard = ticbuild::logging::setup_logging_with_file(
                &workspace.join("build").join("logs"),
                APP_NAME,
                cli.verbose,
            )?;
            tracing::info!("Starting {} v{} in {}", APP_NAME, VERSION, workspace);

            runtime()?.block_on(run(workspace, !no_launch))
        }
        Command::Build => {
            let workspace = ticbuild::config::resolve_workspace(&cli.workspace)?;
            let _guard = ticbuild::logging::setup_logging_with_file(
                &workspace.join("build").join("logs"),
                APP_NAME,
                cli.verbose,
            )?;

            runtime()?.block_on(build(workspace))
        }
    }
}

/// Single-threaded runtime: watch events, builds and player monitors share one thread
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

fn init(workspace: &Utf8Path, assume_yes: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    match Scaffolder::new(workspace).run(assume_yes, &mut input, &mut out)? {
        ScaffoldOutcome::Declined => tracing::debug!("Scaffolding declined"),
        ScaffoldOutcome::Completed { copied, skipped } => {
            println!(
                "Workspace ready: {} files created, {} skipped. Start with `ticbuild run`.",
                copied.len(),
                skipped.len()
            );
        }
    }
    Ok(())
}

async fn run(workspace: Utf8PathBuf, launch: bool) -> Result<()> {
    let config_manager = ConfigManager::new(&workspace);
    let initial = config_manager.load_build_config().unwrap_or_else(|e| {
        tracing::warn!("{}; watching default paths", e);
        BuildConfig::from_documents(
            workspace.clone(),
            &CompilerConfig::default(),
            &ToolConfig::default(),
        )
    });
    let watch_set = WatchSet::for_workspace(&initial);

    let orchestrator =
        BuildOrchestrator::new(config_manager, ExternalToolchain::new(), Arc::new(Metrics::new()))
            .with_launch(launch);

    WatchLoop::new(watch_set, orchestrator).run().await
}

/// One cycle without the player; a launched player would die with the runtime
async fn build(workspace: Utf8PathBuf) -> Result<()> {
    let mut orchestrator = BuildOrchestrator::new(
        ConfigManager::new(&workspace),
        ExternalToolchain::new(),
        Arc::new(Metrics::new()),
    )
    .with_launch(false);

    match orchestrator.run_build_cycle().await {
        Ok(outcome) => {
            tracing::info!("Cartridge ready: {}", outcome.cartridge);
            Ok(())
        }
        Err(e) => {
            tracing::error!("{}", e);
            bail!("Build failed")
        }
    }
}
