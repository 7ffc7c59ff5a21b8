//! Content module - post records, the post index and markdown rendering

mod autolink;
pub mod document;
mod highlight;
pub mod index;
pub mod loader;
mod markdown;
mod post;

pub use document::{Block, CodeBlock, Document, Highlighting, Inline, ListItem, StyledSpan};
pub use highlight::{SyntaxHighlighter, DEFAULT_THEME};
pub use index::{filter_by_category, order, recent, IndexError, PostIndex, RECENT_POSTS};
pub use loader::{DataSource, LocalSource, SourceError};
pub use markdown::{MarkdownRenderer, RenderError};
pub use post::{parse_date_string, CategoryRecord, PostRecord};
