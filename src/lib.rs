//! gitblog-rs: post index and markdown rendering for a git-backed blog
//!
//! The blog's posts live in a separate data repository as a JSON index plus
//! one markdown file per post. This crate turns that raw data into what the
//! pages need: an ordered post list (by category, or just the most recent
//! few) and highlighted HTML for a post body.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Data snapshot directory
    pub data_dir: PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory, reading `_config.yml`
    /// if there is one
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No config at {:?}, using defaults", config_path);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let data_dir = base_dir.join(&config.data_dir);
        Self {
            config,
            base_dir,
            data_dir,
        }
    }

    /// The raw data source for this blog
    pub fn source(&self) -> content::LocalSource {
        content::LocalSource::new(&self.data_dir)
    }

    /// A markdown renderer using the configured highlight theme
    pub fn renderer(&self) -> content::MarkdownRenderer {
        content::MarkdownRenderer::with_theme(&self.config.highlight.theme)
    }
}
