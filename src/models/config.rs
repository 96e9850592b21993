use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Compiler options document (`tsconfig.json`).
///
/// Only the fields the build pipeline reads are modelled; everything else in the
/// document belongs to the compiler and is ignored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Compiled output file, relative to the workspace
    #[serde(default = "default_out_file")]
    pub out_file: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            out_file: default_out_file(),
        }
    }
}

/// Tool options document (`ticbuild.json`)
///
/// Contains the player override, compression settings, cartridge paths and the
/// names of the external tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(default)]
    pub player: PlayerOptions,

    #[serde(default)]
    pub compression: CompressionOptions,

    #[serde(default)]
    pub cartridge: CartridgeOptions,

    #[serde(default)]
    pub tools: ToolCommands,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOptions {
    /// Player executable override. Empty means not configured.
    #[serde(default)]
    pub executable_path: String,
}

/// Minifier settings
///
/// `compress_options` and `mangle_options` are passed through verbatim to the
/// minifier; their keys are not interpreted by this tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionOptions {
    #[serde(default = "default_compressed_file")]
    pub compressed_file: String,

    #[serde(default = "default_indent_level")]
    pub indent_level: u32,

    #[serde(default = "default_true")]
    pub compress: bool,

    #[serde(default = "default_true")]
    pub mangle: bool,

    #[serde(default)]
    pub compress_options: IndexMap<String, serde_json::Value>,

    #[serde(default)]
    pub mangle_options: IndexMap<String, serde_json::Value>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            compressed_file: default_compressed_file(),
            indent_level: default_indent_level(),
            compress: true,
            mangle: true,
            compress_options: IndexMap::new(),
            mangle_options: IndexMap::new(),
        }
    }
}

impl CompressionOptions {
    /// Whether the minifier runs in pretty-print mode
    pub fn is_pretty_print(&self) -> bool {
        !self.compress && !self.mangle
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartridgeOptions {
    /// Final cartridge written by the packager
    #[serde(default = "default_cartridge_output")]
    pub output: String,

    #[serde(default = "default_spritesheet")]
    pub spritesheet: String,

    /// Existing cartridge whose code section gets replaced
    #[serde(default = "default_reference_cartridge")]
    pub reference: String,
}

impl Default for CartridgeOptions {
    fn default() -> Self {
        Self {
            output: default_cartridge_output(),
            spritesheet: default_spritesheet(),
            reference: default_reference_cartridge(),
        }
    }
}

/// Program names of the external tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCommands {
    #[serde(default = "default_compiler")]
    pub compiler: String,

    #[serde(default = "default_minifier")]
    pub minifier: String,

    #[serde(default = "default_packager")]
    pub packager: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            minifier: default_minifier(),
            packager: default_packager(),
        }
    }
}

/// Everything one build cycle needs, with paths resolved against the workspace.
///
/// Built fresh from the two documents at the start of every cycle and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub workspace: Utf8PathBuf,
    pub output_file: Utf8PathBuf,
    pub compressed_file: Utf8PathBuf,
    pub cartridge_file: Utf8PathBuf,
    pub spritesheet: Utf8PathBuf,
    pub reference_cartridge: Utf8PathBuf,
    pub player_override: Option<Utf8PathBuf>,
    pub compression: CompressionOptions,
    pub tools: ToolCommands,
}

impl BuildConfig {
    /// Derive a build config from the two documents.
    pub fn from_documents(
        workspace: Utf8PathBuf,
        compiler: &CompilerConfig,
        tool: &ToolConfig,
    ) -> Self {
        let player_override = match tool.player.executable_path.trim() {
            "" => None,
            path => Some(Utf8PathBuf::from(path)),
        };

        Self {
            output_file: workspace.join(&compiler.compiler_options.out_file),
            compressed_file: workspace.join(&tool.compression.compressed_file),
            cartridge_file: workspace.join(&tool.cartridge.output),
            spritesheet: workspace.join(&tool.cartridge.spritesheet),
            reference_cartridge: workspace.join(&tool.cartridge.reference),
            player_override,
            compression: tool.compression.clone(),
            tools: tool.tools.clone(),
            workspace,
        }
    }

    /// Staging file holding the compiled output with the strict directive removed
    pub fn staging_file(&self) -> Utf8PathBuf {
        self.compressed_file.with_extension("src.js")
    }
}

pub(crate) fn default_out_file() -> String {
    "build/game.js".to_string()
}

fn default_compressed_file() -> String {
    "build/compressed.js".to_string()
}

fn default_indent_level() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_cartridge_output() -> String {
    "build/cart.tic".to_string()
}

fn default_spritesheet() -> String {
    "spritesheet.png".to_string()
}

fn default_reference_cartridge() -> String {
    "cart.tic".to_string()
}

fn default_compiler() -> String {
    "tsc".to_string()
}

fn default_minifier() -> String {
    "uglifyjs".to_string()
}

fn default_packager() -> String {
    "tic80-cart".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_config_defaults() {
        let config = ToolConfig::default();
        assert!(config.player.executable_path.is_empty());
        assert_eq!(config.compression.compressed_file, "build/compressed.js");
        assert_eq!(config.compression.indent_level, 2);
        assert!(config.compression.compress);
        assert!(config.compression.mangle);
        assert_eq!(config.cartridge.output, "build/cart.tic");
        assert_eq!(config.tools.compiler, "tsc");
    }

    #[test]
    fn test_partial_document_falls_back_to_defaults() {
        let config: ToolConfig =
            serde_json::from_str(r#"{ "compression": { "mangle": false } }"#).unwrap();

        assert!(config.compression.compress);
        assert!(!config.compression.mangle);
        assert_eq!(config.compression.compressed_file, "build/compressed.js");
        assert_eq!(config.cartridge, CartridgeOptions::default());
    }

    #[test]
    fn test_option_bags_keep_document_order() {
        let config: ToolConfig = serde_json::from_str(
            r#"{ "compression": { "compressOptions": { "passes": 2, "drop_console": true, "unsafe": false } } }"#,
        )
        .unwrap();

        let keys: Vec<_> = config.compression.compress_options.keys().cloned().collect();
        assert_eq!(keys, vec!["passes", "drop_console", "unsafe"]);
    }

    #[test]
    fn test_build_config_resolves_paths() {
        let compiler: CompilerConfig =
            serde_json::from_str(r#"{ "compilerOptions": { "outFile": "out/main.js" } }"#)
                .unwrap();
        let mut tool = ToolConfig::default();
        tool.player.executable_path = "  ".to_string();

        let config = BuildConfig::from_documents(Utf8PathBuf::from("/ws"), &compiler, &tool);

        assert_eq!(config.output_file, Utf8PathBuf::from("/ws/out/main.js"));
        assert_eq!(config.compressed_file, Utf8PathBuf::from("/ws/build/compressed.js"));
        assert_eq!(config.cartridge_file, Utf8PathBuf::from("/ws/build/cart.tic"));
        assert_eq!(config.spritesheet, Utf8PathBuf::from("/ws/spritesheet.png"));
        assert_eq!(config.reference_cartridge, Utf8PathBuf::from("/ws/cart.tic"));
        assert_eq!(config.player_override, None);
        assert_eq!(config.staging_file(), Utf8PathBuf::from("/ws/build/compressed.src.js"));
    }

    #[test]
    fn test_pretty_print_only_when_both_disabled() {
        let mut options = CompressionOptions::default();
        assert!(!options.is_pretty_print());

        options.compress = false;
        assert!(!options.is_pretty_print());

        options.mangle = false;
        assert!(options.is_pretty_print());
    }
}
