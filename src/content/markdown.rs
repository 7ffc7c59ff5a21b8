//! Markdown rendering with syntax highlighting

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use thiserror::Error;

use super::autolink::autolink_blocks;
use super::document::{Alignment, Block, CodeBlock, Document, Inline, ListItem};
use super::highlight::SyntaxHighlighter;

/// Markdown rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Markdown source is missing")]
    Missing,

    #[error("Markdown source is not UTF-8 text (invalid byte at offset {valid_up_to})")]
    NotText { valid_up_to: usize },
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    highlighter: SyntaxHighlighter,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self {
            highlighter: SyntaxHighlighter::new(),
        }
    }

    /// Create with a named highlighting theme
    pub fn with_theme(theme: &str) -> Self {
        Self {
            highlighter: SyntaxHighlighter::with_theme(theme),
        }
    }

    /// The GFM extension set. All of them are on together; there is no way
    /// to toggle one individually.
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
    }

    /// Render markdown text into a document tree.
    ///
    /// Never fails: odd input (an unterminated fence, a broken table) renders
    /// as whatever the parser can make of it.
    pub fn render(&self, markdown: &str) -> Document {
        let parser = Parser::new_ext(markdown, Self::options());

        let mut builder = TreeBuilder::new(&self.highlighter);
        for event in parser {
            builder.event(event);
        }

        let mut document = builder.finish();
        autolink_blocks(&mut document.blocks);
        document
    }

    /// Render a markdown body as handed over by a data source.
    ///
    /// A missing body or one that is not UTF-8 is an error; an empty body is
    /// a successful, empty document.
    pub fn render_source(&self, source: Option<&[u8]>) -> Result<Document, RenderError> {
        let bytes = source.ok_or(RenderError::Missing)?;
        let text = std::str::from_utf8(bytes).map_err(|e| RenderError::NotText {
            valid_up_to: e.valid_up_to(),
        })?;
        Ok(self.render(text))
    }

    /// Render markdown straight to HTML
    pub fn render_html(&self, markdown: &str) -> String {
        self.render(markdown).to_html()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// An element still being filled in while events stream past
enum Frame {
    Paragraph(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    BlockQuote(Vec<Block>),
    List(Option<u64>, Vec<ListItem>),
    /// A list item plus inline content not yet wrapped in a paragraph
    /// (tight lists put text directly inside the item)
    Item(ListItem, Vec<Inline>),
    Table {
        alignments: Vec<Alignment>,
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    TableHead(Vec<Vec<Inline>>),
    TableRow(Vec<Vec<Inline>>),
    TableCell(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
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
    Code {
        lang: Option<String>,
        text: String,
    },
    FootnoteDefinition(String, Vec<Block>),
    Html(String),
    /// A construct with no tree counterpart; its inlines go to the parent
    Transparent(Vec<Inline>),
}

struct TreeBuilder<'h> {
    highlighter: &'h SyntaxHighlighter,
    stack: Vec<Frame>,
    blocks: Vec<Block>,
}

impl<'h> TreeBuilder<'h> {
    fn new(highlighter: &'h SyntaxHighlighter) -> Self {
        Self {
            highlighter,
            stack: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::Code { text: buf, .. }) | Some(Frame::Html(buf)) => {
                    buf.push_str(&text)
                }
                _ => self.push_inline(Inline::text(text.into_string())),
            },
            Event::Code(code) => self.push_inline(Inline::Code {
                code: code.into_string(),
            }),
            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(buf)) => buf.push_str(&html),
                _ => self.push_inline(Inline::text(html.into_string())),
            },
            Event::InlineHtml(html) => self.push_inline(Inline::text(html.into_string())),
            Event::FootnoteReference(label) => self.push_inline(Inline::FootnoteReference {
                label: label.into_string(),
            }),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => self.push_block(Block::ThematicBreak),
            Event::TaskListMarker(checked) => {
                // Loose items carry the marker inside their first paragraph
                let item = self.stack.iter_mut().rev().find_map(|frame| match frame {
                    Frame::Item(item, _) => Some(item),
                    _ => None,
                });
                if let Some(item) = item {
                    item.task = Some(checked);
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading(level as u8, Vec::new()),
            Tag::BlockQuote(..) => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => Frame::Code {
                lang: match kind {
                    CodeBlockKind::Fenced(info) => fence_language(&info),
                    CodeBlockKind::Indented => None,
                },
                text: String::new(),
            },
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List(start, Vec::new()),
            Tag::Item => Frame::Item(ListItem::default(), Vec::new()),
            Tag::FootnoteDefinition(label) => {
                Frame::FootnoteDefinition(label.into_string(), Vec::new())
            }
            Tag::Table(alignments) => Frame::Table {
                alignments: alignments.into_iter().map(convert_alignment).collect(),
                head: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead => Frame::TableHead(Vec::new()),
            Tag::TableRow => Frame::TableRow(Vec::new()),
            Tag::TableCell => Frame::TableCell(Vec::new()),
            Tag::Emphasis => Frame::Emphasis(Vec::new()),
            Tag::Strong => Frame::Strong(Vec::new()),
            Tag::Strikethrough => Frame::Strikethrough(Vec::new()),
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
                content: Vec::new(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
                alt: Vec::new(),
            },
            _ => Frame::Transparent(Vec::new()),
        };
        self.stack.push(frame);
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph(content) => self.push_block(Block::Paragraph { content }),
            Frame::Heading(level, content) => self.push_block(Block::Heading { level, content }),
            Frame::BlockQuote(blocks) => self.push_block(Block::BlockQuote { blocks }),
            Frame::List(start, items) => self.push_block(Block::List { start, items }),
            Frame::Item(mut item, pending) => {
                if !pending.is_empty() {
                    item.blocks.push(Block::Paragraph { content: pending });
                }
                if let Some(Frame::List(_, items)) = self.stack.last_mut() {
                    items.push(item);
                }
            }
            Frame::Table {
                alignments,
                head,
                rows,
            } => self.push_block(Block::Table {
                alignments,
                head,
                rows,
            }),
            Frame::TableHead(cells) => {
                if let Some(Frame::Table { head, .. }) = self.stack.last_mut() {
                    *head = cells;
                }
            }
            Frame::TableRow(cells) => {
                if let Some(Frame::Table { rows, .. }) = self.stack.last_mut() {
                    rows.push(cells);
                }
            }
            Frame::TableCell(content) => match self.stack.last_mut() {
                Some(Frame::TableHead(cells)) | Some(Frame::TableRow(cells)) => {
                    cells.push(content)
                }
                _ => self.push_inlines(content),
            },
            Frame::Emphasis(content) => self.push_inline(Inline::Emphasis { content }),
            Frame::Strong(content) => self.push_inline(Inline::Strong { content }),
            Frame::Strikethrough(content) => self.push_inline(Inline::Strikethrough { content }),
            Frame::Link {
                url,
                title,
                content,
            } => self.push_inline(Inline::Link {
                url,
                title,
                content,
            }),
            Frame::Image { url, title, alt } => self.push_inline(Inline::Image { url, title, alt }),
            Frame::Code { lang, text } => {
                let block = self.code_block(lang, text);
                self.push_block(Block::Code(block));
            }
            Frame::FootnoteDefinition(label, blocks) => {
                self.push_block(Block::FootnoteDefinition { label, blocks })
            }
            Frame::Html(html) => {
                let html = html.trim_end_matches('\n');
                if !html.is_empty() {
                    self.push_block(Block::Paragraph {
                        content: vec![Inline::text(html)],
                    });
                }
            }
            Frame::Transparent(content) => self.push_inlines(content),
        }
    }

    fn code_block(&self, lang: Option<String>, mut content: String) -> CodeBlock {
        if content.ends_with('\n') {
            content.pop();
        }
        let highlighting = lang
            .as_deref()
            .and_then(|lang| self.highlighter.highlight(lang, &content));
        CodeBlock {
            lang,
            content,
            highlighting,
        }
    }

    fn push_inlines(&mut self, inlines: Vec<Inline>) {
        for inline in inlines {
            self.push_inline(inline);
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        let target = match self.stack.last_mut() {
            Some(Frame::Paragraph(content))
            | Some(Frame::Heading(_, content))
            | Some(Frame::Item(_, content))
            | Some(Frame::TableCell(content))
            | Some(Frame::Emphasis(content))
            | Some(Frame::Strong(content))
            | Some(Frame::Strikethrough(content))
            | Some(Frame::Link { content, .. })
            | Some(Frame::Image { alt: content, .. })
            | Some(Frame::Transparent(content)) => content,
            Some(Frame::Code { text, .. }) | Some(Frame::Html(text)) => {
                text.push_str(&inline.plain_text());
                return;
            }
            _ => {
                self.push_block(Block::Paragraph {
                    content: vec![inline],
                });
                return;
            }
        };
        if let Inline::Text { text } = &inline {
            if let Some(Inline::Text { text: prev }) = target.last_mut() {
                prev.push_str(text);
                return;
            }
        }
        target.push(inline);
    }

    fn push_block(&mut self, block: Block) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::BlockQuote(blocks) | Frame::FootnoteDefinition(_, blocks) => {
                    blocks.push(block);
                    return;
                }
                Frame::Item(item, pending) => {
                    if !pending.is_empty() {
                        let content = std::mem::take(pending);
                        item.blocks.push(Block::Paragraph { content });
                    }
                    item.blocks.push(block);
                    return;
                }
                _ => {}
            }
        }
        self.blocks.push(block);
    }

    fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            self.end();
        }
        Document {
            blocks: self.blocks,
        }
    }
}

/// The language tag is the first word of the fence info string
fn fence_language(info: &CowStr<'_>) -> Option<String> {
    info.split_whitespace().next().map(str::to_string)
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::document::plain_text;

    fn render(md: &str) -> Document {
        MarkdownRenderer::new().render(md)
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = MarkdownRenderer::new().render_html("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_empty_document() {
        assert!(render("").is_empty());
        let doc = MarkdownRenderer::new().render_source(Some(&b""[..])).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render_source(None), Err(RenderError::Missing));
        assert_eq!(
            renderer.render_source(Some(&[b'a', 0xff, b'b'][..])),
            Err(RenderError::NotText { valid_up_to: 1 })
        );
    }

    #[test]
    fn test_fenced_js_block() {
        let doc = render("```js\nconsole.log(1)\n```");
        let blocks = doc.code_blocks();
        assert_eq!(blocks.len(), 1);
        let code = blocks[0];
        assert_eq!(code.lang.as_deref(), Some("js"));
        assert_eq!(code.content, "console.log(1)");
        let highlighting = code.highlighting.as_ref().unwrap();
        assert_eq!(highlighting.syntax, "JavaScript");
        assert_eq!(highlighting.text(), "console.log(1)");
    }

    #[test]
    fn test_untagged_block_matches_tagged_content() {
        let tagged = render("```rust\nfn main() {}\n\n```");
        let untagged = render("```\nfn main() {}\n\n```");
        let tagged = tagged.code_blocks()[0];
        let untagged = untagged.code_blocks()[0];
        assert!(tagged.is_highlighted());
        assert!(!untagged.is_highlighted());
        assert_eq!(untagged.lang, None);
        // only one trailing newline is trimmed
        assert_eq!(untagged.content, "fn main() {}\n");
        assert_eq!(tagged.content, untagged.content);
    }

    #[test]
    fn test_unknown_language_is_plain() {
        let doc = render("```mermaid extra words\ngraph TD\n```");
        let code = doc.code_blocks()[0];
        assert_eq!(code.lang.as_deref(), Some("mermaid"));
        assert!(!code.is_highlighted());
        assert!(doc
            .to_html()
            .contains(r#"<pre><code class="language-mermaid">graph TD</code></pre>"#));
    }

    #[test]
    fn test_indented_code_block() {
        let doc = render("para\n\n    let x = 1;\n");
        let code = doc.code_blocks()[0];
        assert_eq!(code.lang, None);
        assert_eq!(code.content, "let x = 1;");
    }

    #[test]
    fn test_inline_code_is_never_highlighted() {
        let doc = render("Use `rust` here");
        assert!(doc.code_blocks().is_empty());
        match &doc.blocks[0] {
            Block::Paragraph { content } => {
                assert_eq!(content[1], Inline::Code {
                    code: "rust".to_string()
                });
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_fence_still_renders() {
        let doc = render("intro\n\n```rust\nfn main() {}\n");
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.code_blocks()[0].content, "fn main() {}");
    }

    #[test]
    fn test_strikethrough() {
        let doc = render("~~strike~~ and ~one~");
        match &doc.blocks[0] {
            Block::Paragraph { content } => {
                assert_eq!(
                    content[0],
                    Inline::Strikethrough {
                        content: vec![Inline::text("strike")]
                    }
                );
                assert_eq!(
                    content[2],
                    Inline::Strikethrough {
                        content: vec![Inline::text("one")]
                    }
                );
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_table() {
        let doc = render("| a | b |\n| - | :-: |\n| fefe | fefe |\n");
        match &doc.blocks[0] {
            Block::Table {
                alignments,
                head,
                rows,
            } => {
                assert_eq!(alignments, &vec![Alignment::None, Alignment::Center]);
                assert_eq!(plain_text(&head[0]), "a");
                assert_eq!(rows.len(), 1);
                assert_eq!(plain_text(&rows[0][1]), "fefe");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_task_list() {
        let doc = render("* Lists\n* [ ] todo\n* [x] done\n");
        match &doc.blocks[0] {
            Block::List { start, items } => {
                assert_eq!(*start, None);
                assert_eq!(items.len(), 3);
                assert_eq!(items[0].task, None);
                assert_eq!(items[1].task, Some(false));
                assert_eq!(items[2].task, Some(true));
                match &items[2].blocks[..] {
                    [Block::Paragraph { content }] => {
                        assert_eq!(plain_text(content).trim(), "done")
                    }
                    other => panic!("unexpected item blocks {:?}", other),
                }
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_blockquote_with_autolink() {
        let doc = render("> A block quote with ~strikethrough~ and a URL: https://reactjs.org.");
        match &doc.blocks[0] {
            Block::BlockQuote { blocks } => match &blocks[0] {
                Block::Paragraph { content } => {
                    assert!(content.contains(&Inline::Link {
                        url: "https://reactjs.org".to_string(),
                        title: String::new(),
                        content: vec![Inline::text("https://reactjs.org")],
                    }));
                    assert_eq!(content.last(), Some(&Inline::text(".")));
                }
                other => panic!("expected paragraph, got {:?}", other),
            },
            other => panic!("expected block quote, got {:?}", other),
        }
    }

    #[test]
    fn test_autolink_followed_by_punctuation() {
        let html = render("See https://example.com; it is great").to_html();
        assert_eq!(
            html,
            "<p>See <a href=\"https://example.com\">https://example.com</a>; it is great</p>\n"
        );

        let doc = render("請看 https://example.com，謝謝");
        match &doc.blocks[0] {
            Block::Paragraph { content } => {
                assert!(content.iter().any(|inline| matches!(inline, Inline::Link { .. })))
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_url_inside_link_not_relinked() {
        let doc = render("[https://a.com](https://b.com)");
        let html = doc.to_html();
        assert_eq!(html, "<p><a href=\"https://b.com\">https://a.com</a></p>\n");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = MarkdownRenderer::new()
            .render_html("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("text &lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn test_loose_list_item_keeps_paragraphs() {
        let doc = render("- first\n\n  second para\n- next\n");
        match &doc.blocks[0] {
            Block::List { items, .. } => assert_eq!(items[0].blocks.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_footnotes() {
        let doc = render("Claim[^1].\n\n[^1]: Source.\n");
        let html = doc.to_html();
        assert!(html.contains(r##"<sup class="footnote-reference"><a href="#fn-1">1</a></sup>"##));
        assert!(html.contains(r#"id="fn-1""#));
    }

    #[test]
    fn test_sample_post() {
        let markdown = "# A paragraph with *emphasis* and **strong importance**.\n\n\
                        > A block quote with ~strikethrough~ and a URL: https://reactjs.org.\n\n\
                        * Lists\n* [ ] todo\n* [x] done\n\n\
                        A table:\n\n\
                        | a | b |\n| - | - |\n| fefe | fefe |\n";
        let html = MarkdownRenderer::new().render_html(markdown);
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<strong>strong importance</strong>"));
        assert!(html.contains("<del>strikethrough</del>"));
        assert!(html.contains(r#"<a href="https://reactjs.org">https://reactjs.org</a>"#));
        assert!(html.contains(r#"<input type="checkbox" disabled checked />"#));
        assert!(html.contains("done</li>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td>fefe</td>"));
    }

    #[test]
    fn test_renderer_is_shareable_across_threads() {
        let renderer = MarkdownRenderer::new();
        std::thread::scope(|s| {
            let a = s.spawn(|| renderer.render("```rust\nlet a = 1;\n```"));
            let b = s.spawn(|| renderer.render("```go\nfunc main() {}\n```"));
            assert!(a.join().unwrap().code_blocks()[0].is_highlighted());
            assert!(b.join().unwrap().code_blocks()[0].is_highlighted());
        });
    }
}
