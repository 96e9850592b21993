//! Services module - the build pipeline and everything it drives.
//!
//! # Components
//!
//! - [`Toolchain`] / [`ExternalToolchain`]: runs the compiler, minifier and cartridge
//!   packager as subprocesses and captures their exit status and output.
//! - [`minify`]: strict-directive stripping and minifier argument derivation.
//! - [`PlayerProcessManager`]: owns the single live player process and replaces it on
//!   every successful build. [`PlayerResolver`] finds the player executable.
//! - [`BuildOrchestrator`]: one compile → compress → package → relaunch cycle.
//! - [`WatchLoop`]: rebuilds whenever a watched source or the spritesheet changes.
//!
//! # Usage Example
//!
//! ```ignore
//! use ticbuild::services::{BuildOrchestrator, ExternalToolchain, WatchLoop, WatchSet};
//!
//! let config_manager = ConfigManager::new(workspace);
//! let watch_set = WatchSet::for_workspace(&config_manager.load_build_config()?);
//! let orchestrator = BuildOrchestrator::new(config_manager, ExternalToolchain::new(), metrics);
//!
//! WatchLoop::new(watch_set, orchestrator).run().await?;
//! ```
//!
//! # Failure handling
//!
//! A cycle stops at the first failing stage and never relaunches the player. The
//! watch loop logs the error and keeps watching.

pub mod minify;
pub mod orchestrator;
pub mod player;
pub mod toolchain;
pub mod watch;

pub use orchestrator::{BuildOrchestrator, CycleOutcome, LaunchOutcome};
pub use player::{
    PlayerError, PlayerHandle, PlayerProcessManager, PlayerResolution, PlayerResolver,
    ResolutionStrategy,
};
pub use toolchain::{BuildStageError, ExternalToolchain, ToolOutput, Toolchain};
pub use watch::{ChangeKind, PathPattern, RebuildEvent, WatchLoop, WatchSet};
