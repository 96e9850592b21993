use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Workspace directory
    #[arg(long, short, global = true, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create a workspace from the starter templates
    Init {
        /// Copy templates without asking
        #[arg(long, short)]
        yes: bool,
    },

    /// Build, launch the player, and rebuild on every change
    Run {
        /// Build only, never start the player
        #[arg(long)]
        no_launch: bool,
    },

    /// Build the cartridge once and exit
    Build,
}
