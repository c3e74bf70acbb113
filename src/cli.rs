//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paper static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root, the directory holding `Pages/` and `Components/` (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of `paper build`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Maximum number of pages compiled at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep the existing output directory instead of removing it first
    #[arg(long)]
    pub no_clean: bool,

    /// Hide the progress counter
    #[arg(short, long)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile every page in `Pages/` to `Output/`
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Create an empty page, e.g. `paper make:page blog/first-post`
    #[command(name = "make:page")]
    MakePage {
        /// Page path; an all-lowercase path is read as a URL and converted to PascalCase
        path: String,
    },

    /// Create an empty component, e.g. `paper make:component ui/Button`
    #[command(name = "make:component")]
    MakeComponent {
        /// Component path under `Components/`
        path: String,
    },

    /// Print the version
    Version,
}
