//! Content loader - reads the blog's data snapshot
//!
//! The blog keeps its content in a data repository laid out as
//!
//! ```text
//! <data_dir>/categories.json
//! <data_dir>/posts/index.json
//! <data_dir>/posts/contents/<file>.md
//! ```
//!
//! Fetching that repository is someone else's job; the loader only reads a
//! checked-out copy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{CategoryRecord, PostRecord};

/// Errors raised while reading raw records
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid post file name: {0:?}")]
    InvalidFileName(String),
}

/// Supplies raw records and markdown bodies to the pipeline
pub trait DataSource {
    /// All post records, in index order
    fn posts(&self) -> Result<Vec<PostRecord>, SourceError>;

    /// All category records
    fn categories(&self) -> Result<Vec<CategoryRecord>, SourceError>;

    /// The markdown body for a post, or `None` if there is none
    fn markdown(&self, file: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

/// A data snapshot on the local filesystem
pub struct LocalSource {
    data_dir: PathBuf,
}

impl LocalSource {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn index_path(&self) -> PathBuf {
        self.data_dir.join("posts").join("index.json")
    }

    fn categories_path(&self) -> PathBuf {
        self.data_dir.join("categories.json")
    }

    fn content_path(&self, file: &str) -> Result<PathBuf, SourceError> {
        if !is_valid_file_name(file) {
            return Err(SourceError::InvalidFileName(file.to_string()));
        }
        Ok(self
            .data_dir
            .join("posts")
            .join("contents")
            .join(format!("{}.md", file)))
    }
}

impl DataSource for LocalSource {
    fn posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let path = self.index_path();
        let posts: Vec<PostRecord> = read_json(&path)?;
        tracing::debug!("Read {} post records from {:?}", posts.len(), path);
        Ok(posts)
    }

    fn categories(&self) -> Result<Vec<CategoryRecord>, SourceError> {
        let path = self.categories_path();
        if !path.exists() {
            tracing::debug!("No categories file at {:?}", path);
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    fn markdown(&self, file: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let path = self.content_path(file)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("No markdown body for post '{}' at {:?}", file, path);
                Ok(None)
            }
            Err(source) => Err(SourceError::Io { path, source }),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A post `file` must name a single file inside the contents directory
fn is_valid_file_name(file: &str) -> bool {
    !file.is_empty()
        && file != "."
        && file != ".."
        && !file.contains(['/', '\\', '\0'])
}
