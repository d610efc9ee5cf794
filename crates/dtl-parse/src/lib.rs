//! Incremental, error-tolerant parser for Django templates.
//!
//! ```ignore
//! let mut parser = dtl_parse::Parser::new();
//! parser.set_language(dtl_parse::language())?;
//! let tree = parser.parse("{% if x %}hi{% endif %}", None)?;
//! ```

mod blocks;
mod grammar;
pub mod language;
mod parser;
mod reparse;
mod segment;
#[cfg(test)]
mod tests;
mod tree;

pub use dtl_errors::{Diagnostic, UsageError};
pub use dtl_syntax::InputEdit;
pub use language::{
    BlockTag, BranchTag, LANGUAGE_VERSION, Language, MIN_COMPATIBLE_LANGUAGE_VERSION, language,
};
use text_size::TextSize;
pub use tree::Tree;

/// Parses template text into a [`Tree`].
///
/// A parser holds no state besides its language, so one parser can serve
/// any number of documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    language: Option<&'static Language>,
}

impl Parser {
    /// Creates a parser without a language.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_language(&mut self, language: &'static Language) -> Result<(), UsageError> {
        language.check_compatible()?;
        self.language = Some(language);
        Ok(())
    }

    pub fn language(&self) -> Option<&'static Language> {
        self.language
    }

    /// Parses `text`.
    ///
    /// With `old_tree`, segments the old tree still vouches for are reused.
    /// The old tree must have been brought up to date with [`Tree::edit`],
    /// so that its length matches `text`.
    pub fn parse(&self, text: &str, old_tree: Option<&Tree>) -> Result<Tree, UsageError> {
        let language = self.language.ok_or(UsageError::NoLanguage)?;
        let text_len = TextSize::of(text);
        if let Some(old) = old_tree.filter(|old| old.text_len() != text_len) {
            return Err(UsageError::LengthMismatch {
                tree_len: old.text_len().into(),
                text_len: text_len.into(),
            });
        }

        Ok(reparse::reparse(text, language, old_tree))
    }
}

/// Parses `text` from scratch with the Django language.
pub fn parse(text: &str) -> Tree {
    reparse::reparse(text, language(), None)
}
