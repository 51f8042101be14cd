// SPDX-License-Identifier: AGPL-3.0-or-later
//! SharePoint Knife CLI
//!
//! File management for SharePoint document libraries over Microsoft Graph.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spk")]
#[command(author, version, about = "SharePoint Knife - SharePoint document library tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/spk/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    #[command(alias = "dir")]
    Ls {
        /// Path to list (defaults to the drive root)
        #[arg(default_value = "/")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Display file contents
    Cat {
        /// File to display
        path: String,
    },

    /// Upload a local file
    Put {
        /// Local file
        local: PathBuf,

        /// Remote path; a trailing `/` keeps the local file name
        remote: String,

        /// MIME type of the upload
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Copy a file on the server
    Cp {
        /// Source path
        source: String,

        /// Destination path including the new name
        dest: String,
    },

    /// Move or rename files
    Mv {
        /// Source path
        source: String,

        /// Destination path including the new name
        dest: String,
    },

    /// Remove files
    Rm {
        /// Path(s) to remove
        #[arg(required = true)]
        paths: Vec<String>,

        /// Report failures instead of stopping
        #[arg(short, long)]
        force: bool,
    },

    /// Remove directories
    Rmdir {
        /// Directory path(s) to remove
        #[arg(required = true)]
        paths: Vec<String>,

        /// Report failures instead of stopping
        #[arg(short, long)]
        force: bool,
    },

    /// Create directories, including missing parents
    Mkdir {
        /// Directory path(s) to create
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show file or directory information
    Stat {
        /// Path to inspect
        path: String,
    },

    /// Show the configured drive
    Drive,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sp = match commands::connect(cli.config.as_deref(), cli.verbose).await {
        Ok(sp) => sp,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Ls { path, long, human } => commands::ls(&sp, &path, long, human, verbose).await,
        Commands::Cat { path } => commands::cat(&sp, &path, verbose).await,
        Commands::Put { local, remote, mime } => {
            commands::put(&sp, &local, &remote, mime.as_deref(), verbose).await
        }
        Commands::Cp { source, dest } => commands::cp(&sp, &source, &dest, verbose).await,
        Commands::Mv { source, dest } => commands::mv(&sp, &source, &dest, verbose).await,
        Commands::Rm { paths, force } => commands::rm(&sp, &paths, force, verbose).await,
        Commands::Rmdir { paths, force } => commands::rmdir(&sp, &paths, force, verbose).await,
        Commands::Mkdir { paths } => commands::mkdir(&sp, &paths, verbose).await,
        Commands::Stat { path } => commands::stat(&sp, &path, verbose).await,
        Commands::Drive => commands::drive(&sp, verbose).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
