//! List categories

use anyhow::Result;

use crate::content::{DataSource, PostIndex};
use crate::Blog;

/// Print each category with its post count
pub fn run(blog: &Blog) -> Result<()> {
    let source = blog.source();
    let categories = source.categories()?;
    let index = PostIndex::build(&source.posts()?)?;
    tracing::info!("Indexed {} posts", index.len());

    println!("Categories ({}):", categories.len());
    for (category, count) in index.category_counts(&categories) {
        println!("  {} [{}] ({})", category.name, category.slug(), count);
    }

    Ok(())
}
