//! GFM autolink literals: bare `http://`, `https://` and `www.` URLs in text
//! become links.

use lazy_static::lazy_static;
use regex::Regex;

use super::document::{Block, Inline};

lazy_static! {
    static ref URL_CANDIDATE: Regex = Regex::new(r"(?i)(?:https?://|www\.)[^\s<]+").unwrap();
}

/// Link bare URLs in every text run of the given blocks.
/// Text already inside a link, code or image alt text is left alone.
pub fn autolink_blocks(blocks: &mut [Block]) {
    for block in blocks {
        match block {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                autolink_inlines(content)
            }
            Block::BlockQuote { blocks } | Block::FootnoteDefinition { blocks, .. } => {
                autolink_blocks(blocks)
            }
            Block::List { items, .. } => {
                for item in items {
                    autolink_blocks(&mut item.blocks);
                }
            }
            Block::Table { head, rows, .. } => {
                for cell in head.iter_mut().chain(rows.iter_mut().flatten()) {
                    autolink_inlines(cell);
                }
            }
            Block::Code(_) | Block::ThematicBreak => {}
        }
    }
}

fn autolink_inlines(inlines: &mut Vec<Inline>) {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines.drain(..) {
        match inline {
            Inline::Text { text } => out.extend(linkify(&text)),
            Inline::Emphasis { mut content } => {
                autolink_inlines(&mut content);
                out.push(Inline::Emphasis { content });
            }
            Inline::Strong { mut content } => {
                autolink_inlines(&mut content);
                out.push(Inline::Strong { content });
            }
            Inline::Strikethrough { mut content } => {
                autolink_inlines(&mut content);
                out.push(Inline::Strikethrough { content });
            }
            other => out.push(other),
        }
    }
    *inlines = out;
}

/// Split a text run into text and link inlines
pub fn linkify(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;

    for m in URL_CANDIDATE.find_iter(text) {
        let is_www = m.as_str().starts_with(['w', 'W']);
        if !can_start_link(&text[..m.start()], is_www) {
            continue;
        }
        let candidate = trim_trailing(m.as_str());
        if !has_valid_domain(candidate) {
            continue;
        }
        if m.start() > last {
            out.push(Inline::text(&text[last..m.start()]));
        }
        let url = if is_www {
            format!("http://{}", candidate)
        } else {
            candidate.to_string()
        };
        out.push(Inline::Link {
            url,
            title: String::new(),
            content: vec![Inline::text(candidate)],
        });
        last = m.start() + candidate.len();
    }

    if last < text.len() {
        out.push(Inline::text(&text[last..]));
    }
    out
}

/// `www.` links start a run, or follow whitespace or one of `*` `_` `~` `(`.
/// Scheme links only need a non-alphanumeric character before them.
fn can_start_link(before: &str, is_www: bool) -> bool {
    match before.chars().last() {
        None => true,
        Some(c) if is_www => c.is_whitespace() || matches!(c, '*' | '_' | '~' | '('),
        Some(c) => !c.is_ascii_alphanumeric(),
    }
}

/// Drop trailing punctuation, unbalanced closing parentheses and a
/// trailing entity reference
fn trim_trailing(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => {
                url = &url[..url.len() - 1];
            }
            ')' if url.matches(')').count() > url.matches('(').count() => {
                url = &url[..url.len() - 1];
            }
            ';' => {
                let body = &url[..url.len() - 1];
                let name_start = body.trim_end_matches(|c: char| c.is_ascii_alphanumeric()).len();
                url = if name_start < body.len() && body[..name_start].ends_with('&') {
                    &body[..name_start - 1]
                } else {
                    body
                };
            }
            _ => return url,
        }
    }
}

/// The host part of a candidate: everything after the scheme up to the
/// first character that cannot appear in a domain name
fn domain(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) if !url[..i].contains('.') => &url[i + 3..],
        _ => url,
    };
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// At least two dot-separated segments of alphanumerics, `-` or `_`,
/// with no underscore in the last two.
fn has_valid_domain(url: &str) -> bool {
    let segments: Vec<&str> = domain(url).split('.').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return false;
    }
    segments[segments.len() - 2..]
        .iter()
        .all(|s| !s.contains('_'))
}
