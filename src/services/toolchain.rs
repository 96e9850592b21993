use crate::config::ConfigError;
use crate::models::BuildConfig;
use crate::services::minify::minifier_args;
use crate::services::player::PlayerError;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of one external tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Everything the tool printed, stdout first
    pub fn diagnostics(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Errors that abort a build cycle
#[derive(Error, Debug)]
pub enum BuildStageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation failed with exit code {code}:\n{diagnostics}")]
    Compile { code: i32, diagnostics: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Minifier failed with exit code {code}:\n{diagnostics}")]
    Minify { code: i32, diagnostics: String },

    #[error("Packaging failed with exit code {code}:\n{diagnostics}")]
    Package { code: i32, diagnostics: String },

    #[error("Failed to launch player: {0}")]
    Launch(#[from] PlayerError),
}

impl BuildStageError {
    pub(crate) fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The three external tools of the pipeline.
///
/// Implementations only run the tool and report what it did; deciding whether an
/// exit code aborts the cycle is left to the orchestrator.
///
/// Cycles run on a current-thread runtime, so the futures are not required to be `Send`.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait Toolchain {
    /// Run the compiler in the workspace with no arguments
    async fn compile(&self, config: &BuildConfig) -> Result<ToolOutput, BuildStageError>;

    /// Minify `input` into `config.compressed_file`
    async fn minify(
        &self,
        config: &BuildConfig,
        input: &Utf8Path,
    ) -> Result<ToolOutput, BuildStageError>;

    /// Assemble the cartridge from the compressed script and the spritesheet
    async fn package(&self, config: &BuildConfig) -> Result<ToolOutput, BuildStageError>;
}

/// Toolchain backed by real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalToolchain;

impl ExternalToolchain {
    pub fn new() -> Self {
        Self
    }

    /// Build a command for a tool.
    ///
    /// The program is looked up on `PATH` (honoring `PATHEXT` on Windows), so the
    /// node-based tools' `.cmd` shims are spawned directly and receive every argument
    /// as-is. A program that cannot be found is left for `spawn` to report.
    fn command(program: &str) -> Command {
        match which::which(program) {
            Ok(path) => Command::new(path),
            Err(_) => Command::new(program),
        }
    }

    fn compile_command(config: &BuildConfig) -> Command {
        let mut command = Self::command(&config.tools.compiler);
        command.current_dir(&config.workspace);
        command
    }

    fn minify_command(config: &BuildConfig, input: &Utf8Path) -> Command {
        let mut command = Self::command(&config.tools.minifier);
        command
            .current_dir(&config.workspace)
            .args(minifier_args(input, &config.compressed_file, &config.compression));
        command
    }

    fn package_command(config: &BuildConfig) -> Command {
        let mut command = Self::command(&config.tools.packager);
        command
            .current_dir(&config.workspace)
            .args(Self::packager_args(config));
        command
    }

    /// Arguments for the packager, in the order it expects them
    pub fn packager_args(config: &BuildConfig) -> Vec<String> {
        vec![
            "--input".to_string(),
            config.compressed_file.to_string(),
            "--output".to_string(),
            config.cartridge_file.to_string(),
            "--spritesheetImagePath".to_string(),
            config.spritesheet.to_string(),
            "--cartridgePath".to_string(),
            config.reference_cartridge.to_string(),
        ]
    }

    async fn run(tool: &'static str, mut command: Command) -> Result<ToolOutput, BuildStageError> {
        tracing::debug!("Executing {}: {:?}", tool, command.as_std());

        let start = Instant::now();
        let output = command
            .output()
            .await
            .map_err(|source| BuildStageError::Spawn { tool, source })?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            "{} completed in {:.2}s with exit code {}",
            tool,
            start.elapsed().as_secs_f32(),
            exit_code
        );

        Ok(ToolOutput {
            code: exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Toolchain for ExternalToolchain {
    async fn compile(&self, config: &BuildConfig) -> Result<ToolOutput, BuildStageError> {
        Self::run("compiler", Self::compile_command(config)).await
    }

    async fn minify(
        &self,
        config: &BuildConfig,
        input: &Utf8Path,
    ) -> Result<ToolOutput, BuildStageError> {
        Self::run("minifier", Self::minify_command(config, input)).await
    }

    async fn package(&self, config: &BuildConfig) -> Result<ToolOutput, BuildStageError> {
        Self::run("packager", Self::package_command(config)).await
    }
}
