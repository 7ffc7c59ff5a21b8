//! Post index: ordering, category filtering and the recent-posts slice
//!
//! Every post list on the blog (home listing, recent-posts widget, category
//! pages) is ordered by the same rule: most recent effective date first,
//! where the effective date is the edit date if present, else the creation
//! date. Equal dates keep their input order.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use super::post::{CategoryRecord, PostRecord};

/// Number of posts shown by the recent-posts widget
pub const RECENT_POSTS: usize = 3;

/// Post index errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Invalid post record '{file}': {reason}")]
    InvalidPostRecord { file: String, reason: String },
}

/// Order posts by effective date, newest first.
///
/// The sort is stable and the input is left untouched. Records sharing a
/// `file` with an earlier record are dropped. Fails on the first record
/// without a usable date.
pub fn order(posts: &[PostRecord]) -> Result<Vec<PostRecord>, IndexError> {
    let mut seen = HashSet::new();
    let mut dated: Vec<(DateTime<Utc>, &PostRecord)> = Vec::with_capacity(posts.len());

    for post in posts {
        let date = post
            .effective_date()
            .map_err(|reason| IndexError::InvalidPostRecord {
                file: post.file.clone(),
                reason,
            })?;
        if seen.insert(post.file.as_str()) {
            dated.push((date, post));
        }
    }

    // `sort_by` is stable
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(dated.into_iter().map(|(_, post)| post.clone()).collect())
}

/// Posts tagged with `category`, in effective-date order
pub fn filter_by_category(
    posts: &[PostRecord],
    category: &str,
) -> Result<Vec<PostRecord>, IndexError> {
    let ordered = order(posts)?;
    Ok(ordered
        .into_iter()
        .filter(|post| post.has_category(category))
        .collect())
}

/// The first `n` posts of an already ordered list
pub fn recent(ordered: &[PostRecord], n: usize) -> &[PostRecord] {
    &ordered[..n.min(ordered.len())]
}

/// A validated, ordered and deduplicated set of posts
#[derive(Debug, Clone, Default)]
pub struct PostIndex {
    posts: Vec<PostRecord>,
}

impl PostIndex {
    /// Build the index from raw records
    pub fn build(records: &[PostRecord]) -> Result<Self, IndexError> {
        Ok(Self {
            posts: order(records)?,
        })
    }

    /// All posts, newest first
    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Post count per category, in the order the categories are given
    pub fn category_counts<'a>(
        &self,
        categories: &'a [CategoryRecord],
    ) -> Vec<(&'a CategoryRecord, usize)> {
        categories
            .iter()
            .map(|cat| {
                let slug = cat.slug();
                let count = self.posts.iter().filter(|p| p.has_category(&slug)).count();
                (cat, count)
            })
            .collect()
    }
}
