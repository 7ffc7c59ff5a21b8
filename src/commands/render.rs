//! Render a post body to HTML

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::{DataSource, Document};
use crate::Blog;

/// Output format of the render command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Html,
    /// The rendered block tree as JSON
    Json,
}

/// Render the post identified by `file` and write it to `output`,
/// or to stdout when no output path is given
pub fn run(blog: &Blog, file: &str, format: Format, output: Option<&Path>) -> Result<()> {
    let document = render_document(blog, file)?;
    let rendered = match format {
        Format::Html => document.to_html(),
        Format::Json => serde_json::to_string_pretty(&document)? + "\n",
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &rendered).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Render the post identified by `file` to HTML
pub fn render_post(blog: &Blog, file: &str) -> Result<String> {
    Ok(render_document(blog, file)?.to_html())
}

/// Render the post identified by `file` to a document tree
pub fn render_document(blog: &Blog, file: &str) -> Result<Document> {
    let body = blog.source().markdown(file)?;
    let document = blog
        .renderer()
        .render_source(body.as_deref())
        .with_context(|| format!("Cannot render post '{}'", file))?;

    tracing::debug!(
        "Rendered '{}': {} blocks, {} code blocks",
        file,
        document.blocks.len(),
        document.code_blocks().len()
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn blog_with_post(body: Option<&str>) -> (TempDir, Blog) {
        let dir = TempDir::new().unwrap();
        let contents = dir.path().join("data").join("posts").join("contents");
        fs::create_dir_all(&contents).unwrap();
        if let Some(body) = body {
            fs::write(contents.join("hello.md"), body).unwrap();
        }
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        (dir, blog)
    }

    #[test]
    fn test_render_post() {
        let (_dir, blog) = blog_with_post(Some("# Hi\n\n```js\nconsole.log(1)\n```\n"));
        let html = render_post(&blog, "hello").unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains(r#"<code class="language-js"><span style="#));
    }

    #[test]
    fn test_render_empty_post() {
        let (_dir, blog) = blog_with_post(Some(""));
        assert_eq!(render_post(&blog, "hello").unwrap(), "");
    }

    #[test]
    fn test_render_missing_post_fails() {
        let (_dir, blog) = blog_with_post(None);
        let err = render_post(&blog, "hello").unwrap_err();
        assert!(err.to_string().contains("hello"));
    }

    #[test]
    fn test_render_to_file() {
        let (dir, blog) = blog_with_post(Some("text"));
        let out = dir.path().join("public").join("hello.html");
        run(&blog, "hello", Format::Html, Some(&out)).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "<p>text</p>\n");
    }

    #[test]
    fn test_render_json() {
        let (dir, blog) = blog_with_post(Some("- [x] done"));
        let out = dir.path().join("hello.json");
        run(&blog, "hello", Format::Json, Some(&out)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["blocks"][0]["type"], "list");
        assert_eq!(value["blocks"][0]["items"][0]["task"], true);
    }
}
