use crate::config::ConfigManager;
use crate::metrics::Metrics;
use crate::models::BuildConfig;
use crate::services::minify::{SUSPICIOUS_OUTPUT_LEN, strip_strict_directive};
use crate::services::player::{
    PlayerError, PlayerProcessManager, PlayerResolution, PlayerResolver,
};
use crate::services::toolchain::{BuildStageError, Toolchain};
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to the player at the end of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched { path: Utf8PathBuf, pid: Option<u32> },
    /// No player executable could be resolved; build-only mode
    SkippedUnresolved,
    /// Launching was turned off on the command line
    SkippedDisabled,
}

/// Result of a successful build cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub cartridge: Utf8PathBuf,
    pub compressed_len: usize,
    pub launch: LaunchOutcome,
    pub duration: Duration,
}

/// Runs the compile → compress → package → relaunch pipeline.
///
/// Stages run strictly in order and any failure ends the cycle before the player is
/// touched. The configuration is reread at the start of every cycle.
pub struct BuildOrchestrator<T: Toolchain> {
    config_manager: ConfigManager,
    toolchain: T,
    resolver: PlayerResolver,
    player: PlayerProcessManager,
    launch_enabled: bool,
    metrics: Arc<Metrics>,
}

impl<T: Toolchain> BuildOrchestrator<T> {
    pub fn new(config_manager: ConfigManager, toolchain: T, metrics: Arc<Metrics>) -> Self {
        Self {
            config_manager,
            toolchain,
            resolver: PlayerResolver::default(),
            player: PlayerProcessManager::new(Arc::clone(&metrics)),
            launch_enabled: true,
            metrics,
        }
    }

    /// Replace the player path resolution strategies
    pub fn with_resolver(mut self, resolver: PlayerResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enable or disable launching the player after a build
    pub fn with_launch(mut self, enabled: bool) -> Self {
        self.launch_enabled = enabled;
        self
    }

    /// Run one full build cycle.
    ///
    /// # Errors
    /// Returns the first stage error. The player is only relaunched when every stage
    /// succeeded.
    pub async fn run_build_cycle(&mut self) -> Result<CycleOutcome, BuildStageError> {
        self.metrics.record_cycle_started();
        let start = Instant::now();

        let result = self.execute_stages(start).await;

        self.metrics
            .record_cycle_finished(result.is_ok(), start.elapsed());
        result
    }

    async fn execute_stages(&mut self, start: Instant) -> Result<CycleOutcome, BuildStageError> {
        let config = self.config_manager.load_build_config()?;

        self.compile(&config).await?;
        let compressed_len = self.compress(&config).await?;
        self.package(&config).await?;
        let launch = self.relaunch(&config).await?;

        let duration = start.elapsed();
        tracing::info!("Build finished in {:.2}s", duration.as_secs_f32());

        Ok(CycleOutcome {
            cartridge: config.cartridge_file,
            compressed_len,
            launch,
            duration,
        })
    }

    async fn compile(&self, config: &BuildConfig) -> Result<(), BuildStageError> {
        tracing::info!("Compiling {}", config.workspace);

        let output = self.toolchain.compile(config).await?;
        if !output.success() {
            return Err(BuildStageError::Compile {
                code: output.code,
                diagnostics: output.diagnostics(),
            });
        }

        tracing::info!("Compiled to {}", config.output_file);
        Ok(())
    }

    /// Strip the strict directive and minify.
    ///
    /// # Returns
    /// Length of the compressed script
    async fn compress(&self, config: &BuildConfig) -> Result<usize, BuildStageError> {
        tracing::info!("Compressing {}", config.output_file);

        let compiled = tokio::fs::read_to_string(&config.output_file)
            .await
            .map_err(|e| BuildStageError::io(&config.output_file, e))?;
        let source = strip_strict_directive(&compiled);

        let staging = config.staging_file();
        if let Some(parent) = staging.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildStageError::io(parent, e))?;
        }
        tokio::fs::write(&staging, source)
            .await
            .map_err(|e| BuildStageError::io(&staging, e))?;

        let output = self.toolchain.minify(config, &staging).await?;
        if !output.success() {
            return Err(BuildStageError::Minify {
                code: output.code,
                diagnostics: output.diagnostics(),
            });
        }

        let compressed = tokio::fs::read_to_string(&config.compressed_file)
            .await
            .map_err(|e| BuildStageError::io(&config.compressed_file, e))?;

        if compressed.len() < SUSPICIOUS_OUTPUT_LEN {
            tracing::warn!(
                "Compressed script is only {} characters long. Source before minification:\n{}",
                compressed.len(),
                source
            );
        }

        tracing::info!(
            "Compressed {} -> {} characters ({})",
            source.len(),
            compressed.len(),
            config.compressed_file
        );
        Ok(compressed.len())
    }

    async fn package(&self, config: &BuildConfig) -> Result<(), BuildStageError> {
        tracing::info!("Packaging {}", config.cartridge_file);

        let output = self.toolchain.package(config).await?;
        if !output.success() {
            return Err(BuildStageError::Package {
                code: output.code,
                diagnostics: output.diagnostics(),
            });
        }

        tracing::info!("Cartridge written to {}", config.cartridge_file);
        Ok(())
    }

    async fn relaunch(&mut self, config: &BuildConfig) -> Result<LaunchOutcome, BuildStageError> {
        if !self.launch_enabled {
            tracing::info!("Launching disabled, skipping player");
            return Ok(LaunchOutcome::SkippedDisabled);
        }

        match self.resolver.resolve(config) {
            PlayerResolution::Unresolved => {
                tracing::info!("No player executable found, skipping launch");
                Ok(LaunchOutcome::SkippedUnresolved)
            }
            PlayerResolution::Found { path, source } => {
                tracing::info!("Launching {} (from {})", path, source);
                let handle = self
                    .player
                    .relaunch(&path, &config.workspace, &config.cartridge_file)
                    .await?;
                Ok(LaunchOutcome::Launched {
                    pid: handle.id(),
                    path,
                })
            }
        }
    }

    /// Stop the live player, if any
    pub async fn shutdown(&mut self) -> Result<bool, PlayerError> {
        self.player.shutdown().await
    }

    pub fn player(&self) -> &PlayerProcessManager {
        &self.player
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
