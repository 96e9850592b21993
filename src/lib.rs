// ticbuild - build, package and live-reload TypeScript games for TIC-80
//
// This is the library crate containing the build pipeline and workspace handling.
// The binary crate (main.rs) provides the command line entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod scaffold;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigManager};
pub use metrics::Metrics;
pub use models::{BuildConfig, CompilerConfig, ToolConfig};
pub use scaffold::{ScaffoldOutcome, Scaffolder};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
