//! CLI entry point for gitblog-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitblog_rs::commands::list::ListOptions;
use gitblog_rs::commands::render::Format;

#[derive(Parser)]
#[command(name = "gitblog")]
#[command(version)]
#[command(about = "Post listing and markdown rendering for a git-backed blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List posts, newest first
    #[command(alias = "ls")]
    List {
        /// Only posts in this category (slug)
        #[arg(short, long)]
        category: Option<String>,

        /// Only the most recent posts
        #[arg(short, long)]
        recent: bool,
    },

    /// List categories with post counts
    Categories,

    /// Render a post body to HTML
    #[command(alias = "r")]
    Render {
        /// Post identifier (the `file` field of the index)
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Html)]
        format: Format,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "gitblog_rs=debug,info"
    } else {
        "gitblog_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::List { category, recent } => {
            let blog = gitblog_rs::Blog::new(&base_dir)?;
            gitblog_rs::commands::list::run(&blog, &ListOptions { category, recent })?;
        }

        Commands::Categories => {
            let blog = gitblog_rs::Blog::new(&base_dir)?;
            gitblog_rs::commands::categories::run(&blog)?;
        }

        Commands::Render {
            file,
            format,
            output,
        } => {
            let blog = gitblog_rs::Blog::new(&base_dir)?;
            tracing::info!("Rendering post '{}'", file);
            gitblog_rs::commands::render::run(&blog, &file, format, output.as_deref())?;
        }

        Commands::Version => {
            println!("gitblog-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
