//! Rendered document tree
//!
//! The markdown renderer produces a `Document`: a sequence of block-level
//! elements whose leaves are inline spans. Nothing in the tree is executable;
//! raw HTML from the source is carried as plain text and escaped on output.

use serde::Serialize;

use crate::helpers::html_escape;

/// A rendered markdown document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Block-level element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    BlockQuote {
        blocks: Vec<Block>,
    },
    List {
        /// Start number for ordered lists, `None` for bullet lists
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Table {
        alignments: Vec<Alignment>,
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Code(CodeBlock),
    FootnoteDefinition {
        label: String,
        blocks: Vec<Block>,
    },
    ThematicBreak,
}

/// A list item, optionally carrying a task-list checkbox
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListItem {
    /// `Some(true)` for `[x]`, `Some(false)` for `[ ]`
    pub task: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

/// Inline element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text {
        text: String,
    },
    /// Inline code span; never highlighted
    Code {
        code: String,
    },
    Emphasis {
        content: Vec<Inline>,
    },
    Strong {
        content: Vec<Inline>,
    },
    Strikethrough {
        content: Vec<Inline>,
    },
    Link {
        url: String,
        title: String,
        content: Vec<Inline>,
    },
    Image {
        url: String,
        title: String,
        alt: Vec<Inline>,
    },
    FootnoteReference {
        label: String,
    },
    SoftBreak,
    HardBreak,
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text { text: s.into() }
    }

    /// Concatenated text content, with markup stripped
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { text } => text.clone(),
            Inline::Code { code } => code.clone(),
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => plain_text(content),
            Inline::Image { alt, .. } => plain_text(alt),
            Inline::FootnoteReference { label } => label.clone(),
            Inline::SoftBreak | Inline::HardBreak => " ".to_string(),
        }
    }
}

/// A fenced or indented code block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlock {
    /// Language tag from the opening fence, passed through unchanged
    pub lang: Option<String>,
    /// Block content with one trailing newline removed
    pub content: String,
    /// Present only when the tag named a known language
    pub highlighting: Option<Highlighting>,
}

impl CodeBlock {
    pub fn is_highlighted(&self) -> bool {
        self.highlighting.is_some()
    }
}

/// Syntax-highlighted form of a code block's content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlighting {
    /// Name of the syntax used, e.g. `JavaScript`
    pub syntax: String,
    pub spans: Vec<StyledSpan>,
}

impl Highlighting {
    /// The highlighted text with styling removed
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A run of code text sharing one style
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    pub text: String,
    /// Foreground colour as `(r, g, b)`
    pub color: (u8, u8, u8),
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyledSpan {
    fn css(&self) -> String {
        let (r, g, b) = self.color;
        let mut css = format!("color:#{:02x}{:02x}{:02x};", r, g, b);
        if self.bold {
            css.push_str("font-weight:bold;");
        }
        if self.italic {
            css.push_str("font-style:italic;");
        }
        if self.underline {
            css.push_str("text-decoration:underline;");
        }
        css
    }
}

/// Concatenated text of a run of inlines
pub fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Code blocks anywhere in the document, in source order
    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        let mut out = Vec::new();
        collect_code_blocks(&self.blocks, &mut out);
        out
    }

    /// Serialize to HTML. All text and attribute values are escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_blocks(&mut out, &self.blocks);
        out
    }
}

fn collect_code_blocks<'a>(blocks: &'a [Block], out: &mut Vec<&'a CodeBlock>) {
    for block in blocks {
        match block {
            Block::Code(code) => out.push(code),
            Block::BlockQuote { blocks } | Block::FootnoteDefinition { blocks, .. } => {
                collect_code_blocks(blocks, out)
            }
            Block::List { items, .. } => {
                for item in items {
                    collect_code_blocks(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

fn write_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        write_block(out, block);
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { content } => {
            out.push_str("<p>");
            write_inlines(out, content);
            out.push_str("</p>\n");
        }
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{}>", level));
            write_inlines(out, content);
            out.push_str(&format!("</h{}>\n", level));
        }
        Block::BlockQuote { blocks } => {
            out.push_str("<blockquote>\n");
            write_blocks(out, blocks);
            out.push_str("</blockquote>\n");
        }
        Block::List { start, items } => {
            let has_tasks = items.iter().any(|i| i.task.is_some());
            let class = if has_tasks {
                r#" class="contains-task-list""#
            } else {
                ""
            };
            match start {
                Some(1) => out.push_str(&format!("<ol{}>\n", class)),
                Some(n) => out.push_str(&format!("<ol start=\"{}\"{}>\n", n, class)),
                None => out.push_str(&format!("<ul{}>\n", class)),
            }
            for item in items {
                write_list_item(out, item);
            }
            out.push_str(if start.is_some() { "</ol>\n" } else { "</ul>\n" });
        }
        Block::Table {
            alignments,
            head,
            rows,
        } => {
            out.push_str("<table>\n<thead>\n<tr>\n");
            for (i, cell) in head.iter().enumerate() {
                write_cell(out, "th", alignments.get(i), cell);
            }
            out.push_str("</tr>\n</thead>\n");
            if !rows.is_empty() {
                out.push_str("<tbody>\n");
                for row in rows {
                    out.push_str("<tr>\n");
                    for (i, cell) in row.iter().enumerate() {
                        write_cell(out, "td", alignments.get(i), cell);
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</tbody>\n");
            }
            out.push_str("</table>\n");
        }
        Block::Code(code) => write_code_block(out, code),
        Block::FootnoteDefinition { label, blocks } => {
            let id = html_escape(&slug::slugify(label));
            out.push_str(&format!(
                r#"<div class="footnote-definition" id="fn-{}"><sup class="footnote-definition-label">{}</sup>"#,
                id,
                html_escape(label)
            ));
            out.push('\n');
            write_blocks(out, blocks);
            out.push_str("</div>\n");
        }
        Block::ThematicBreak => out.push_str("<hr />\n"),
    }
}

fn write_list_item(out: &mut String, item: &ListItem) {
    match item.task {
        Some(checked) => {
            out.push_str(r#"<li class="task-list-item"><input type="checkbox" disabled"#);
            if checked {
                out.push_str(" checked");
            }
            out.push_str(" /> ");
        }
        None => out.push_str("<li>"),
    }
    // Tight list items hold a single paragraph; emit its inlines bare
    match item.blocks.as_slice() {
        [Block::Paragraph { content }] => write_inlines(out, content),
        blocks => write_blocks(out, blocks),
    }
    out.push_str("</li>\n");
}

fn write_cell(out: &mut String, tag: &str, alignment: Option<&Alignment>, content: &[Inline]) {
    let style = match alignment {
        Some(Alignment::Left) => r#" style="text-align: left""#,
        Some(Alignment::Center) => r#" style="text-align: center""#,
        Some(Alignment::Right) => r#" style="text-align: right""#,
        _ => "",
    };
    out.push_str(&format!("<{}{}>", tag, style));
    write_inlines(out, content);
    out.push_str(&format!("</{}>\n", tag));
}

fn write_code_block(out: &mut String, code: &CodeBlock) {
    match &code.lang {
        Some(lang) => out.push_str(&format!(
            r#"<pre><code class="language-{}">"#,
            html_escape(lang)
        )),
        None => out.push_str("<pre><code>"),
    }
    match &code.highlighting {
        Some(highlighting) => {
            for span in &highlighting.spans {
                out.push_str(&format!(
                    r#"<span style="{}">{}</span>"#,
                    span.css(),
                    html_escape(&span.text)
                ));
            }
        }
        None => out.push_str(&html_escape(&code.content)),
    }
    out.push_str("</code></pre>\n");
}

fn write_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        write_inline(out, inline);
    }
}

fn write_inline(out: &mut String, inline: &Inline) {
    match inline {
        Inline::Text { text } => out.push_str(&html_escape(text)),
        Inline::Code { code } => {
            out.push_str("<code>");
            out.push_str(&html_escape(code));
            out.push_str("</code>");
        }
        Inline::Emphasis { content } => wrap(out, "em", content),
        Inline::Strong { content } => wrap(out, "strong", content),
        Inline::Strikethrough { content } => wrap(out, "del", content),
        Inline::Link {
            url,
            title,
            content,
        } => {
            out.push_str("<a");
            if is_safe_url(url) {
                out.push_str(&format!(r#" href="{}""#, html_escape(url)));
            }
            if !title.is_empty() {
                out.push_str(&format!(r#" title="{}""#, html_escape(title)));
            }
            out.push('>');
            write_inlines(out, content);
            out.push_str("</a>");
        }
        Inline::Image { url, title, alt } => {
            out.push_str("<img");
            if is_safe_url(url) {
                out.push_str(&format!(r#" src="{}""#, html_escape(url)));
            }
            out.push_str(&format!(r#" alt="{}""#, html_escape(&plain_text(alt))));
            if !title.is_empty() {
                out.push_str(&format!(r#" title="{}""#, html_escape(title)));
            }
            out.push_str(" />");
        }
        Inline::FootnoteReference { label } => {
            let id = html_escape(&slug::slugify(label));
            out.push_str(&format!(
                r##"<sup class="footnote-reference"><a href="#fn-{}">{}</a></sup>"##,
                id,
                html_escape(label)
            ));
        }
        Inline::SoftBreak => out.push('\n'),
        Inline::HardBreak => out.push_str("<br />\n"),
    }
}

fn wrap(out: &mut String, tag: &str, content: &[Inline]) {
    out.push_str(&format!("<{}>", tag));
    write_inlines(out, content);
    out.push_str(&format!("</{}>", tag));
}

/// Reject URL schemes that would run script when followed
fn is_safe_url(url: &str) -> bool {
    let scheme: String = url
        .trim_start()
        .chars()
        .take_while(|c| *c != ':' && *c != '/' && *c != '?' && *c != '#')
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let has_scheme = url.contains(':') && !scheme.is_empty();
    !(has_scheme && matches!(scheme.as_str(), "javascript" | "vbscript" | "data"))
}
