//! Language-tag lookup and syntax highlighting for code blocks

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::document::{Highlighting, StyledSpan};

/// Theme used when the configured one does not exist
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Maps language tags to syntect syntaxes and highlights code with them.
///
/// A tag that names no known syntax (or only plain text) gets no
/// highlighting at all.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Create with a named theme from syntect's default theme set
    pub fn with_theme(theme: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(theme)
            .or_else(|| themes.remove(DEFAULT_THEME))
            .unwrap_or_default();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Find the syntax for a language tag, matching name or file extension
    /// case-insensitively
    pub fn resolve(&self, lang: &str) -> Option<&SyntaxReference> {
        let token = lang.trim().to_ascii_lowercase();
        if token.is_empty() {
            return None;
        }
        let plain = self.syntax_set.find_syntax_plain_text();
        self.syntax_set
            .find_syntax_by_token(&token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(&token))
            .filter(|syntax| syntax.name != plain.name)
    }

    /// Whether a language tag selects a highlighting syntax
    pub fn is_known(&self, lang: &str) -> bool {
        self.resolve(lang).is_some()
    }

    /// Highlight `code` as `lang`. `None` means the block stays plain, either
    /// because the tag is unknown or because the syntax failed on the input.
    pub fn highlight(&self, lang: &str, code: &str) -> Option<Highlighting> {
        let syntax = self.resolve(lang)?;
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        // The newline-aware syntaxes expect every line to end in '\n'
        let input = format!("{}\n", code);
        let mut spans: Vec<StyledSpan> = Vec::new();
        for line in LinesWithEndings::from(&input) {
            let regions = highlighter.highlight_line(line, &self.syntax_set).ok()?;
            for (style, text) in regions {
                push_span(&mut spans, style, text);
            }
        }

        if let Some(last) = spans.last_mut() {
            last.text.pop();
            if last.text.is_empty() {
                spans.pop();
            }
        }

        Some(Highlighting {
            syntax: syntax.name.clone(),
            spans,
        })
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a region, merging it into the previous span when styles match
fn push_span(spans: &mut Vec<StyledSpan>, style: Style, text: &str) {
    if text.is_empty() {
        return;
    }
    let fg = style.foreground;
    let span = StyledSpan {
        text: text.to_string(),
        color: (fg.r, fg.g, fg.b),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    };
    match spans.last_mut() {
        Some(prev)
            if prev.color == span.color
                && prev.bold == span.bold
                && prev.italic == span.italic
                && prev.underline == span.underline =>
        {
            prev.text.push_str(&span.text);
        }
        _ => spans.push(span),
    }
}
