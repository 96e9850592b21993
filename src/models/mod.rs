//! Data models for ticbuild.
//!
//! - [`CompilerConfig`]: the subset of `tsconfig.json` the pipeline reads (compiled output path)
//! - [`ToolConfig`]: player override, compression, cartridge paths and tool names from `ticbuild.json`
//! - [`BuildConfig`]: the per-cycle view of both documents with workspace-resolved paths
//!
//! All document structs derive `Serialize`/`Deserialize` and default every field, so a
//! partial document is always valid.

pub mod config;

pub use config::{
    BuildConfig, CartridgeOptions, CompilerConfig, CompilerOptions, CompressionOptions,
    PlayerOptions, ToolCommands, ToolConfig,
};
