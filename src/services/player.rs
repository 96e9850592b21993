//! Player executable resolution and lifecycle.
//!
//! [`PlayerResolver`] finds the player executable by trying an ordered list of
//! [`ResolutionStrategy`] values. [`PlayerProcessManager`] owns the one live player
//! process, if any, and replaces it on every successful build.
//!
//! # Examples
//!
//! ```ignore
//! let resolver = PlayerResolver::default();
//! if let PlayerResolution::Found { path, .. } = resolver.resolve(&config) {
//!     manager.relaunch(&path, &config.workspace, &config.cartridge_file).await?;
//! }
//! ```

use crate::metrics::Metrics;
use crate::models::BuildConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Where a player executable path can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// The install location of the official build on this platform
    PlatformDefault,
    /// `player.executablePath` in the tool config
    ConfigOverride,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlatformDefault => write!(f, "platform default"),
            Self::ConfigOverride => write!(f, "tool config"),
        }
    }
}

/// Outcome of player path resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerResolution {
    Found {
        path: Utf8PathBuf,
        source: ResolutionStrategy,
    },
    Unresolved,
}

/// Default install location of the player on the current platform
pub fn platform_default_player() -> Option<Utf8PathBuf> {
    let path = if cfg!(target_os = "windows") {
        "C:/Program Files (x86)/Tic80/tic80.exe"
    } else if cfg!(target_os = "macos") {
        "/Applications/tic80.app/Contents/MacOS/tic80"
    } else if cfg!(unix) {
        "/usr/bin/tic80"
    } else {
        return None;
    };
    Some(Utf8PathBuf::from(path))
}

/// Ordered player path resolution.
///
/// Evaluated once per cycle; nothing is cached, so installing the player or editing
/// the config takes effect on the next rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerResolver {
    strategies: Vec<ResolutionStrategy>,
}

impl PlayerResolver {
    pub fn new(strategies: Vec<ResolutionStrategy>) -> Self {
        Self { strategies }
    }

    /// Return the first candidate that exists on disk
    pub fn resolve(&self, config: &BuildConfig) -> PlayerResolution {
        for &strategy in &self.strategies {
            let candidate = match strategy {
                ResolutionStrategy::PlatformDefault => platform_default_player(),
                ResolutionStrategy::ConfigOverride => config.player_override.clone(),
            };

            match candidate {
                Some(path) if path.exists() => {
                    tracing::debug!("Resolved player from {}: {}", strategy, path);
                    return PlayerResolution::Found {
                        path,
                        source: strategy,
                    };
                }
                Some(path) => {
                    tracing::debug!("Player candidate from {} does not exist: {}", strategy, path);
                }
                None => {}
            }
        }

        PlayerResolution::Unresolved
    }
}

impl Default for PlayerResolver {
    fn default() -> Self {
        Self::new(vec![
            ResolutionStrategy::PlatformDefault,
            ResolutionStrategy::ConfigOverride,
        ])
    }
}

/// Errors from starting or stopping the player
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Failed to start player {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Player monitor task failed: {0}")]
    Monitor(#[from] tokio::task::JoinError),
}

/// Handle to a running player process.
///
/// The process is watched by a monitor task that logs its exit. Terminating (or
/// dropping) the handle kills the process.
#[derive(Debug)]
pub struct PlayerHandle {
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
    monitor: JoinHandle<()>,
}

impl PlayerHandle {
    /// OS process id, if the process was still running when spawned
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process has not exited yet
    pub fn is_live(&self) -> bool {
        !self.monitor.is_finished()
    }

    /// Kill the process and wait until it has been reaped
    async fn terminate(mut self) -> Result<(), PlayerError> {
        if let Some(kill_tx) = self.kill_tx.take() {
            // Fails only if the process already exited on its own
            let _ = kill_tx.send(());
        }
        (&mut self.monitor).await?;
        Ok(())
    }
}

/// Owner of the single live player process
pub struct PlayerProcessManager {
    current: Option<PlayerHandle>,
    metrics: Arc<Metrics>,
}

impl PlayerProcessManager {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            current: None,
            metrics,
        }
    }

    /// Build the player command line
    pub fn player_command(executable: &Utf8Path, workspace: &Utf8Path, cartridge: &Utf8Path) -> Command {
        let mut command = Command::new(executable);
        command
            .arg("-root_path")
            .arg(workspace)
            .arg("-run")
            .arg(cartridge)
            .current_dir(workspace);
        command
    }

    /// Stop the running player, if any, then start a new one on `cartridge`.
    ///
    /// The previous process is killed and reaped before the new one is spawned, so two
    /// players never run at the same time.
    pub async fn relaunch(
        &mut self,
        executable: &Utf8Path,
        workspace: &Utf8Path,
        cartridge: &Utf8Path,
    ) -> Result<&PlayerHandle, PlayerError> {
        let command = Self::player_command(executable, workspace, cartridge);
        self.start(executable.as_str(), command).await
    }

    pub(crate) async fn start(
        &mut self,
        label: &str,
        mut command: Command,
    ) -> Result<&PlayerHandle, PlayerError> {
        self.shutdown().await?;

        let mut child = command
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                path: label.to_string(),
                source,
            })?;

        let pid = child.id();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let metrics = Arc::clone(&self.metrics);

        let monitor = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => {
                        tracing::debug!("Player exited normally");
                    }
                    Ok(status) => {
                        metrics.record_player_failure();
                        tracing::info!(
                            "Player exited with code {}",
                            status.code().map_or_else(|| "none".to_string(), |c| c.to_string())
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Failed to wait for player: {}", e);
                    }
                },
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill player: {}", e);
                    } else {
                        tracing::debug!("Player terminated");
                    }
                }
            }
        });

        self.metrics.record_player_launch();
        tracing::info!("Player started (pid {})", pid.unwrap_or(0));

        Ok(self.current.insert(PlayerHandle {
            pid,
            kill_tx: Some(kill_tx),
            monitor,
        }))
    }

    /// Terminate the live player, if any
    ///
    /// # Returns
    /// `true` if a still-running player was killed
    pub async fn shutdown(&mut self) -> Result<bool, PlayerError> {
        let Some(handle) = self.current.take() else {
            return Ok(false);
        };

        let was_live = handle.is_live();
        if was_live {
            tracing::info!("Stopping previous player (pid {})", handle.id().unwrap_or(0));
        }
        handle.terminate().await?;
        Ok(was_live)
    }

    /// The current handle, which may belong to a process that already exited
    pub fn current(&self) -> Option<&PlayerHandle> {
        self.current.as_ref()
    }

    /// Whether a player process is currently running
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(PlayerHandle::is_live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompilerConfig, ToolConfig};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn config_with_override(path: Option<&str>) -> BuildConfig {
        let mut tool = ToolConfig::default();
        tool.player.executable_path = path.unwrap_or_default().to_string();
        BuildConfig::from_documents(Utf8PathBuf::from("/ws"), &CompilerConfig::default(), &tool)
    }

    #[test]
    fn test_resolve_config_override() {
        let temp_dir = TempDir::new().unwrap();
        let player = temp_dir.path().join("tic80");
        std::fs::write(&player, "").unwrap();

        let resolver = PlayerResolver::new(vec![ResolutionStrategy::ConfigOverride]);
        let config = config_with_override(player.to_str());

        assert_eq!(
            resolver.resolve(&config),
            PlayerResolution::Found {
                path: Utf8PathBuf::try_from(player).unwrap(),
                source: ResolutionStrategy::ConfigOverride,
            }
        );
    }

    #[test]
    fn test_resolve_missing_override_is_unresolved() {
        let resolver = PlayerResolver::new(vec![ResolutionStrategy::ConfigOverride]);

        let missing = config_with_override(Some("/nonexistent/ticbuild/tic80"));
        assert_eq!(resolver.resolve(&missing), PlayerResolution::Unresolved);

        let empty = config_with_override(None);
        assert_eq!(resolver.resolve(&empty), PlayerResolution::Unresolved);
    }

    #[test]
    fn test_default_resolver_order() {
        assert_eq!(
            PlayerResolver::default().strategies,
            vec![
                ResolutionStrategy::PlatformDefault,
                ResolutionStrategy::ConfigOverride
            ]
        );
    }

    #[test]
    fn test_player_command_args() {
        let command = PlayerProcessManager::player_command(
            Utf8Path::new("/opt/tic80"),
            Utf8Path::new("/ws"),
            Utf8Path::new("/ws/build/cart.tic"),
        );

        let args: Vec<_> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-root_path", "/ws", "-run", "/ws/build/cart.tic"]);
    }

    #[tokio::test]
    async fn test_shutdown_without_player() {
        let mut manager = PlayerProcessManager::new(Arc::new(Metrics::new()));
        assert!(!manager.shutdown().await.unwrap());
        assert!(!manager.is_running());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_relaunch_kills_previous_before_spawning() {
        let metrics = Arc::new(Metrics::new());
        let mut manager = PlayerProcessManager::new(Arc::clone(&metrics));

        let mut first = Command::new("sleep");
        first.arg("30");
        let first_pid = manager.start("sleep", first).await.unwrap().id().unwrap();
        assert!(manager.is_running());

        let mut second = Command::new("sleep");
        second.arg("30");
        let second_pid = manager.start("sleep", second).await.unwrap().id().unwrap();

        assert_ne!(first_pid, second_pid);
        assert!(!std::path::Path::new(&format!("/proc/{}", first_pid)).exists());
        assert!(std::path::Path::new(&format!("/proc/{}", second_pid)).exists());
        assert_eq!(metrics.player_launches.load(Ordering::Relaxed), 2);

        assert!(manager.shutdown().await.unwrap());
        assert!(!std::path::Path::new(&format!("/proc/{}", second_pid)).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_player_exit_is_observed() {
        let metrics = Arc::new(Metrics::new());
        let mut manager = PlayerProcessManager::new(Arc::clone(&metrics));

        manager.start("false", Command::new("false")).await.unwrap();
        for _ in 0..100 {
            if !manager.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert!(!manager.is_running());
        assert_eq!(metrics.player_failures.load(Ordering::Relaxed), 1);
        assert!(!manager.shutdown().await.unwrap());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let mut manager = PlayerProcessManager::new(Arc::new(Metrics::new()));
        let err = manager
            .relaunch(
                Utf8Path::new("/nonexistent/ticbuild/tic80"),
                Utf8Path::new("."),
                Utf8Path::new("cart.tic"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PlayerError::Spawn { .. }));
        assert!(manager.current().is_none());
    }
}
