//! File watching and the rebuild loop.
//!
//! The loop builds once on start, then rebuilds on every filesystem notification that
//! touches a path in its [`WatchSet`]. Events from the `notify` thread are funnelled
//! through a channel so cycles run one after another on the runtime; there is no
//! debouncing, a burst of saves simply queues several cycles.

use crate::models::BuildConfig;
use crate::services::orchestrator::{BuildOrchestrator, LaunchOutcome};
use crate::services::toolchain::Toolchain;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use notify::{EventKind, RecursiveMode, Watcher};
use std::future::Future;
use tokio::sync::mpsc;

/// One watched path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Every file with `extension` anywhere under `dir`
    Extension { dir: Utf8PathBuf, extension: String },
    /// Exactly this file
    File(Utf8PathBuf),
}

impl PathPattern {
    pub fn matches(&self, path: &Utf8Path) -> bool {
        match self {
            Self::Extension { dir, extension } => {
                path.starts_with(dir) && path.extension() == Some(extension.as_str())
            }
            Self::File(file) => path == file,
        }
    }

    /// Directory to subscribe to and how
    fn watch_root(&self) -> Option<(&Utf8Path, RecursiveMode)> {
        match self {
            Self::Extension { dir, .. } => Some((dir.as_path(), RecursiveMode::Recursive)),
            // Editors often replace files on save, so watch the parent directory
            Self::File(file) => file.parent().map(|p| (p, RecursiveMode::NonRecursive)),
        }
    }
}

/// Immutable set of watched patterns, fixed when the loop starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSet {
    patterns: Vec<PathPattern>,
}

impl WatchSet {
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    /// TypeScript sources under `src/` and the spritesheet image
    pub fn for_workspace(config: &BuildConfig) -> Self {
        Self::new(vec![
            PathPattern::Extension {
                dir: config.workspace.join("src"),
                extension: "ts".to_string(),
            },
            PathPattern::File(config.spritesheet.clone()),
        ])
    }

    pub fn matches(&self, path: &Utf8Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Deduplicated directories to subscribe to
    fn watch_roots(&self) -> Vec<(Utf8PathBuf, RecursiveMode)> {
        let mut roots: Vec<(Utf8PathBuf, RecursiveMode)> = Vec::new();
        for (dir, mode) in self.patterns.iter().filter_map(PathPattern::watch_root) {
            match roots.iter_mut().find(|(existing, _)| existing.as_path() == dir) {
                Some(entry) if mode == RecursiveMode::Recursive => entry.1 = mode,
                Some(_) => {}
                None => roots.push((dir.to_path_buf(), mode)),
            }
        }
        roots
    }
}

/// Kind of a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Other,
}

/// One filesystem change that should trigger a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildEvent {
    pub path: Utf8PathBuf,
    pub kind: ChangeKind,
}

impl RebuildEvent {
    /// First path of a notification that falls inside the watch set.
    ///
    /// Access notifications are dropped: the compiler reading sources must not
    /// retrigger a build.
    pub fn from_notify(event: &notify::Event, watch_set: &WatchSet) -> Option<Self> {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Any | EventKind::Other => ChangeKind::Other,
            EventKind::Access(_) => return None,
        };

        event
            .paths
            .iter()
            .filter_map(|p| Utf8Path::from_path(p))
            .find(|p| watch_set.matches(p))
            .map(|path| Self {
                path: path.to_path_buf(),
                kind,
            })
    }
}

/// Long-running build loop over a [`WatchSet`]
pub struct WatchLoop<T: Toolchain> {
    watch_set: WatchSet,
    orchestrator: BuildOrchestrator<T>,
}

impl<T: Toolchain> WatchLoop<T> {
    pub fn new(watch_set: WatchSet, orchestrator: BuildOrchestrator<T>) -> Self {
        Self {
            watch_set,
            orchestrator,
        }
    }

    /// Build, then watch until Ctrl-C.
    ///
    /// # Errors
    /// Only watcher setup failures are returned; build failures are logged and the
    /// loop keeps going.
    pub async fn run(self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel::<notify::Result<notify::Event>>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            // Receiver gone means the loop is shutting down
            let _ = tx.send(res);
        })
        .context("Failed to create file watcher")?;

        for (dir, mode) in self.watch_set.watch_roots() {
            if !dir.exists() {
                tracing::warn!("Not watching {}: directory does not exist", dir);
                continue;
            }
            watcher
                .watch(dir.as_std_path(), mode)
                .with_context(|| format!("Failed to watch {}", dir))?;
            tracing::info!("Watching {}", dir);
        }

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        self.run_until(rx, shutdown).await;
        drop(watcher);
        Ok(())
    }

    /// Build once, then rebuild for every matching notification until `shutdown`
    /// resolves or the event channel closes. The player is stopped on exit.
    pub async fn run_until<F>(
        mut self,
        mut events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
        shutdown: F,
    ) -> BuildOrchestrator<T>
    where
        F: Future<Output = ()>,
    {
        self.cycle().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down watch loop");
                    break;
                }
                received = events.recv() => match received {
                    Some(Ok(event)) => {
                        if let Some(change) = RebuildEvent::from_notify(&event, &self.watch_set) {
                            tracing::info!("{:?}: {}", change.kind, change.path);
                            self.cycle().await;
                        }
                    }
                    Some(Err(e)) => tracing::warn!("File watcher error: {}", e),
                    None => break,
                },
            }
        }

        if let Err(e) = self.orchestrator.shutdown().await {
            tracing::warn!("Failed to stop player: {}", e);
        }
        self.orchestrator.metrics().log_summary();
        self.orchestrator
    }

    /// One build cycle with its failure contained
    async fn cycle(&mut self) {
        match self.orchestrator.run_build_cycle().await {
            Ok(outcome) => {
                if let LaunchOutcome::Launched { pid, .. } = outcome.launch {
                    tracing::debug!("Player running with pid {:?}", pid);
                }
                tracing::info!("Waiting for changes...");
            }
            Err(e) => {
                tracing::error!("Build failed: {}", e);
                tracing::info!("Waiting for changes...");
            }
        }
    }
}
