//! Paper - a static site builder for stencil and markdown pages.

mod build;
mod cli;
mod compiler;
mod config;
mod engine;
mod error;
mod filesystem;
mod logger;
mod make;
mod site;
mod utils;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{BuildArgs, Cli, Commands};
use config::{ProjectPaths, SiteConfig, resolve_root};
use engine::StencilEngine;
use error::BuildError;
use filesystem::LocalFilesystem;
use make::{Scaffold, make};
use std::{path::Path, process::ExitCode};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<BuildError>() {
                Some(build_error) => logger::report(&build_error.to_string()),
                None => log!("error"; "{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let root = resolve_root(cli.root.as_deref());

    match &cli.command {
        Commands::Build { build_args } => build(&root, build_args).await,
        Commands::MakePage { path } => scaffold(&root, Scaffold::Page, path).await,
        Commands::MakeComponent { path } => scaffold(&root, Scaffold::Component, path).await,
        Commands::Version => {
            println!("paper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn build(root: &Path, args: &BuildArgs) -> Result<()> {
    let mut config = SiteConfig::load(root)?;
    config.update_with_cli(args);
    config.validate()?;

    let report = build_site(&config, &LocalFilesystem, &StencilEngine).await?;
    log!("build"; "{} pages, {} assets written to {}", report.pages, report.assets, config.paths.output.display());
    Ok(())
}

async fn scaffold(root: &Path, kind: Scaffold, input: &str) -> Result<()> {
    let paths = ProjectPaths::new(root);
    make(kind, input, &paths, &LocalFilesystem).await?;
    Ok(())
}
