//! Problems reported by the parser.
//!
//! Two kinds of problems exist. A [`Diagnostic`] describes malformed input:
//! it is attached to a syntax tree and never stops parsing. A [`UsageError`]
//! describes a caller mistake, such as an edit outside of the tree or a
//! parser without a language, and is returned as an `Err`.

use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;
use text_size::TextSize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }

    /// Moves the diagnostic by `offset` bytes.
    #[must_use]
    pub fn shifted(&self, offset: TextSize) -> Self {
        Self { message: self.message.clone(), range: self.range + offset }
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let message = Level::Error.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

/// A mistake made by the caller of the parsing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("the parser has no language assigned")]
    NoLanguage,
    #[error("language version {version} is not supported (expected {min}..={max})")]
    IncompatibleLanguage { version: u32, min: u32, max: u32 },
    #[error("edit {start}..{old_end} is out of bounds for a tree of {len} bytes")]
    EditOutOfBounds { start: u32, old_end: u32, len: u32 },
    #[error("edit is inverted: start {start}, old end {old_end}, new end {new_end}")]
    InvalidEdit { start: u32, old_end: u32, new_end: u32 },
    #[error("the tree covers {tree_len} bytes but the text has {text_len}")]
    LengthMismatch { tree_len: u32, text_len: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_range() {
        let text = "{% if x";
        let diagnostic = Diagnostic::error("unclosed tag", TextRange::new(0.into(), 7.into()));
        let rendered = diagnostic.render(&Renderer::plain(), "index.html", text).to_string();

        assert!(rendered.contains("error: unclosed tag"), "{rendered}");
        assert!(rendered.contains("index.html"), "{rendered}");
        assert!(rendered.contains("here"), "{rendered}");
    }

    #[test]
    fn shifted_moves_range() {
        let diagnostic = Diagnostic::error("x", TextRange::new(1.into(), 3.into()));
        assert_eq!(diagnostic.shifted(10.into()).range(), TextRange::new(11.into(), 13.into()));
    }

    #[test]
    fn usage_error_messages() {
        let error = UsageError::LengthMismatch { tree_len: 3, text_len: 4 };
        assert_eq!(error.to_string(), "the tree covers 3 bytes but the text has 4");
    }
}
