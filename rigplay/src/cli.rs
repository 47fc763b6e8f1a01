//! Root CLI structure for rigplay

use clap::{Parser, Subcommand};

use crate::commands::{
    info::InfoArgs, play::PlayArgs, rig::RigArgs, tree::TreeArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "rigplay")]
#[command(about = "Inspect and play rigged, animated scene snapshots", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize nodes, meshes, bones and clips of a scene
    Info(InfoArgs),

    /// Display the node hierarchy as a tree
    Tree(TreeArgs),

    /// Check a scene for structural problems
    Validate(ValidateArgs),

    /// Print the bone segments below a node at a point in time
    Rig(RigArgs),

    /// Play a clip for a number of frames and report the result
    Play(PlayArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
