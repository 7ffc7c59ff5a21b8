//! List posts

use anyhow::Result;

use crate::content::{filter_by_category, order, recent, DataSource, PostRecord};
use crate::helpers::{format_date, truncate};
use crate::Blog;

/// Which slice of the index to list
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only posts in this category
    pub category: Option<String>,
    /// Only the most recent posts
    pub recent: bool,
}

/// Print the ordered post list
pub fn run(blog: &Blog, options: &ListOptions) -> Result<()> {
    let records = blog.source().posts()?;
    tracing::info!("Read {} post records", records.len());

    let lines = listing(blog, &records, options)?;
    println!("{}", heading(blog, options, lines.len()));
    for line in lines {
        println!("  {}", line);
    }

    Ok(())
}

fn heading(blog: &Blog, options: &ListOptions, count: usize) -> String {
    match &options.category {
        Some(category) => format!("{} - Posts in '{}' ({}):", blog.config.title, category, count),
        None => format!("{} - Posts ({}):", blog.config.title, count),
    }
}

/// One display line per selected post
pub fn listing(blog: &Blog, records: &[PostRecord], options: &ListOptions) -> Result<Vec<String>> {
    let ordered = match &options.category {
        Some(category) => filter_by_category(records, category)?,
        None => order(records)?,
    };
    let posts = if options.recent {
        recent(&ordered, blog.config.recent_posts)
    } else {
        &ordered[..]
    };

    posts.iter().map(|post| format_post(blog, post)).collect()
}

fn format_post(blog: &Blog, post: &PostRecord) -> Result<String> {
    // Records in a built index always have a date
    let date = post
        .effective_date()
        .map_err(|reason| anyhow::anyhow!("Post '{}': {}", post.file, reason))?;
    let mut line = format!(
        "{} - {} [{}]",
        format_date(&date, &blog.config.date_format),
        post.title,
        post.file
    );
    if !post.excerpt.is_empty() {
        line.push_str(" - ");
        line.push_str(&truncate(&post.excerpt, blog.config.excerpt_length, None));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn blog() -> Blog {
        let mut config = SiteConfig::default();
        config.recent_posts = 2;
        config.excerpt_length = 10;
        config.title = "Eddie's Blog".to_string();
        Blog::with_config(".", config)
    }

    fn records() -> Vec<PostRecord> {
        let mut a = PostRecord::new("Alpha", "a", "2024-01-01");
        a.categories = vec!["rust".to_string()];
        a.excerpt = "A rather long excerpt".to_string();
        let mut b = PostRecord::new("Beta", "b", "2024-03-01");
        b.edited_date = Some("2024-06-01".to_string());
        let mut c = PostRecord::new("Gamma", "c", "2024-02-01");
        c.categories = vec!["rust".to_string()];
        vec![a, b, c]
    }

    #[test]
    fn test_listing_all() {
        let lines = listing(&blog(), &records(), &ListOptions::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                "2024-06-01 - Beta [b]",
                "2024-02-01 - Gamma [c]",
                "2024-01-01 - Alpha [a] - A rathe...",
            ]
        );
    }

    #[test]
    fn test_listing_recent_in_category() {
        let options = ListOptions {
            category: Some("rust".to_string()),
            recent: true,
        };
        let lines = listing(&blog(), &records(), &options).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[c]"));
        assert!(lines[1].contains("[a]"));
    }

    #[test]
    fn test_listing_recent_without_category() {
        let options = ListOptions {
            category: None,
            recent: true,
        };
        let lines = listing(&blog(), &records(), &options).unwrap();
        assert_eq!(
            lines,
            vec!["2024-06-01 - Beta [b]", "2024-02-01 - Gamma [c]"]
        );
    }

    #[test]
    fn test_listing_rejects_undated_record() {
        let mut posts = records();
        posts[1].created_date = None;
        posts[1].edited_date = None;
        let err = listing(&blog(), &posts, &ListOptions::default()).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_heading_shows_site_title() {
        let options = ListOptions {
            category: Some("rust".to_string()),
            recent: false,
        };
        assert_eq!(heading(&blog(), &ListOptions::default(), 3), "Eddie's Blog - Posts (3):");
        assert_eq!(heading(&blog(), &options, 2), "Eddie's Blog - Posts in 'rust' (2):");
    }
}
