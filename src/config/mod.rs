use crate::models::{BuildConfig, CompilerConfig, ToolConfig};
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use std::fs;
use thiserror::Error;

/// Compiler options document name
pub const COMPILER_CONFIG_FILE: &str = "tsconfig.json";

/// Tool options document name
pub const TOOL_CONFIG_FILE: &str = "ticbuild.json";

/// Errors raised while reading the configuration documents
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Workspace not found: {path}: {source}")]
    Workspace {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration manager for the two JSON documents of a workspace.
///
/// Manages:
/// - Compiler config (`tsconfig.json`): compiled output location
/// - Tool config (`ticbuild.json`): player, compression and cartridge settings
///
/// Nothing is cached; every [`load_build_config`](Self::load_build_config) call rereads
/// both files so edits made while watching apply to the next cycle.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    workspace: Utf8PathBuf,
    compiler_config_path: Utf8PathBuf,
    tool_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager for the given workspace directory.
    pub fn new<P: AsRef<Utf8Path>>(workspace: P) -> Self {
        let workspace = workspace.as_ref().to_path_buf();

        Self {
            compiler_config_path: workspace.join(COMPILER_CONFIG_FILE),
            tool_config_path: workspace.join(TOOL_CONFIG_FILE),
            workspace,
        }
    }

    /// Load the compiler options document.
    ///
    /// The compiler cannot run without it, so a missing file is an error.
    pub fn load_compiler_config(&self) -> Result<CompilerConfig, ConfigError> {
        read_json(&self.compiler_config_path)
    }

    /// Load the tool options document.
    ///
    /// # Returns
    /// The loaded ToolConfig, or defaults if the file doesn't exist
    pub fn load_tool_config(&self) -> Result<ToolConfig, ConfigError> {
        if !self.tool_config_path.exists() {
            tracing::warn!(
                "Tool config file not found at {}, using defaults",
                self.tool_config_path
            );
            return Ok(ToolConfig::default());
        }

        read_json(&self.tool_config_path)
    }

    /// Read both documents and derive a fresh [`BuildConfig`].
    pub fn load_build_config(&self) -> Result<BuildConfig, ConfigError> {
        let compiler = self.load_compiler_config()?;
        let tool = self.load_tool_config()?;

        let config = BuildConfig::from_documents(self.workspace.clone(), &compiler, &tool);
        tracing::debug!(
            "Build config: output={}, compressed={}, cartridge={}",
            config.output_file,
            config.compressed_file,
            config.cartridge_file
        );
        Ok(config)
    }

    /// Get the workspace path.
    pub fn workspace(&self) -> &Utf8Path {
        &self.workspace
    }

    pub fn compiler_config_path(&self) -> &Utf8Path {
        &self.compiler_config_path
    }

    pub fn tool_config_path(&self) -> &Utf8Path {
        &self.tool_config_path
    }
}

/// Absolute path of an existing workspace directory.
///
/// Symlinks are resolved so watcher events compare equal to configured paths. On Windows
/// the path is only made absolute: `canonicalize` returns `\\?\` verbatim paths, which
/// the node tools and the player do not accept as working or root directories.
pub fn resolve_workspace(workspace: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    let error = |source: std::io::Error| ConfigError::Workspace {
        path: workspace.to_path_buf(),
        source,
    };

    if !workspace.is_dir() {
        return Err(error(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not a directory",
        )));
    }

    let resolved = if cfg!(windows) {
        std::path::absolute(workspace)
    } else {
        fs::canonicalize(workspace)
    }
    .map_err(error)?;

    Utf8PathBuf::try_from(resolved).map_err(|e| error(e.into_io_error()))
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, ConfigError> {
    let file_contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_str(&file_contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded {}", path);
    Ok(value)
}
