// git-fat - large files for git, kept out of the object database
// Copyright (C) 2025 git-fat Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

mod commands;
mod output;
mod progress;
mod repo;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::*;
use gitfat_git::FatError;
use gitfat_observability::{init_tracing_with_config, LogConfig, LogFormat};
use repo::FatRepo;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-fat")]
#[command(version, about = "Keep large files out of git history")]
#[command(
    long_about = "git-fat replaces large file contents with small placeholder records in git,
keeps the real bytes in a local cache under .git/fat, and moves them to and from
a shared rsync remote on push and pull."
)]
#[command(propagate_version = true)]
#[command(author = "git-fat Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Run as if started in PATH
    #[arg(short = 'C', global = true, value_name = "PATH")]
    directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the fat filter driver in this repository
    Init(InitCmd),

    /// Show orphan and garbage objects
    Status(StatusCmd),

    /// Send cached objects referenced by history to the remote
    Push(PushCmd),

    /// Fetch missing objects from the remote and restore them
    Pull(PullCmd),

    /// Restore placeholders whose data is in the cache
    Checkout(CheckoutCmd),

    /// Delete cached objects not referenced by HEAD
    Gc(GcCmd),

    /// Check that every cached object matches its name
    Verify(VerifyCmd),

    /// List paths in history that ever held a large blob
    Find(FindCmd),

    /// Rewrite the index for `git filter-branch --index-filter`
    #[command(name = "index-filter")]
    IndexFilter(IndexFilterCmd),

    /// Clean filter: content on stdin, placeholder on stdout
    #[command(name = "filter-clean")]
    FilterClean(FilterCleanCmd),

    /// Smudge filter: placeholder on stdin, content on stdout
    #[command(name = "filter-smudge")]
    FilterSmudge(FilterSmudgeCmd),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.color.as_str() {
        "never" => console::set_colors_enabled(false),
        "always" => console::set_colors_enabled(true),
        "auto" => {}
        _ => {
            output::error(&format!("Invalid color option: {}", cli.color));
            std::process::exit(1);
        }
    }

    if let Err(e) = run(cli) {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Cannot change to {}", dir.display()))?;
    }

    let command = match cli.command {
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            return Ok(());
        }
        Some(command) => command,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let mut repo = FatRepo::open(cli.quiet)?;
    if cli.verbose {
        repo.config_mut().observability.verbose = true;
    }
    if !cli.quiet {
        init_logging(&repo)?;
    }
    if command.requires_initialization() {
        repo.require_initialized()?;
    }

    match command {
        Commands::Init(cmd) => cmd.execute(&repo),
        Commands::Status(cmd) => cmd.execute(&repo),
        Commands::Push(cmd) => cmd.execute(&repo),
        Commands::Pull(cmd) => cmd.execute(&repo),
        Commands::Checkout(cmd) => cmd.execute(&repo),
        Commands::Gc(cmd) => cmd.execute(&repo),
        Commands::Verify(cmd) => cmd.execute(&repo),
        Commands::Find(cmd) => cmd.execute(&repo),
        Commands::IndexFilter(cmd) => cmd.execute(&repo),
        Commands::FilterClean(cmd) => cmd.execute(&repo),
        Commands::FilterSmudge(cmd) => cmd.execute(&repo),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

impl Commands {
    /// The filters run inside git itself and `init` is what installs them.
    fn requires_initialization(&self) -> bool {
        !matches!(
            self,
            Commands::Init(_)
                | Commands::FilterClean(_)
                | Commands::FilterSmudge(_)
                | Commands::Completions { .. }
        )
    }
}

/// Logs go to stderr; stdout belongs to the filters.
fn init_logging(repo: &FatRepo) -> Result<()> {
    let settings = &repo.config().observability;
    let format: LogFormat = settings.log_format.parse()?;
    let config = LogConfig::new()
        .with_format(format)
        .with_level(settings.effective_level())
        .with_color(console::colors_enabled_stderr());
    init_tracing_with_config(config).context("Failed to initialize logging")
}

/// A failed transfer exits with the transfer tool's own status.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| match cause.downcast_ref::<FatError>() {
            Some(FatError::TransferFailure {
                exit_code: Some(code),
                ..
            }) => Some(*code),
            _ => None,
        })
        .unwrap_or(1)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "git-fat", &mut io::stdout());
}
