//! Structural queries over syntax trees.
//!
//! Patterns use S-expressions in the style of tree-sitter:
//!
//! ```text
//! ; tags named `if`
//! (tag (tag_name) @name (#eq? @name "if")) @tag
//! (filter (filter_name) @filter)
//! ```
//!
//! `(kind child...)` matches a node whose children contain the child
//! patterns in order, not necessarily adjacent. `(_)` matches any named
//! node, `_` any node and `"|"` an anonymous node by its text.

mod compile;
mod matcher;

use std::fmt;

use dtl_parse::Language;
use dtl_syntax::SyntaxNode;

use crate::compile::Pattern;
pub use crate::matcher::{QueryCursor, QueryMatches};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct QueryError {
    /// Byte offset into the query source.
    pub offset: u32,
    pub kind: QueryErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryErrorKind {
    #[error("invalid syntax")]
    Syntax,
    #[error("unknown node type `{0}`")]
    NodeType(String),
    #[error("capture `@{0}` is not defined in this pattern")]
    Capture(String),
    #[error("{0}")]
    Predicate(String),
}

/// A compiled set of patterns.
pub struct Query {
    patterns: Vec<Pattern>,
    capture_names: Vec<Box<str>>,
}

impl Query {
    pub fn new(language: &Language, source: &str) -> Result<Self, QueryError> {
        let compiled = compile::compile(language, source)?;
        Ok(Self { patterns: compiled.patterns, capture_names: compiled.capture_names })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Capture names, indexed by [`QueryCapture::index`].
    pub fn capture_names(&self) -> &[Box<str>] {
        &self.capture_names
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names.iter().position(|it| &**it == name).map(|index| index as u32)
    }

    /// Matches of every pattern against `node` and its descendants, in
    /// pre-order and then pattern order. `source` is the text of the tree and
    /// is only read by predicates.
    pub fn matches<'q, 't, 's>(
        &'q self,
        node: SyntaxNode<'t>,
        source: &'s str,
    ) -> QueryMatches<'q, 't, 's> {
        QueryMatches::new(self, node, source)
    }

    pub(crate) fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("patterns", &self.patterns.len())
            .field("capture_names", &self.capture_names)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch<'t> {
    pub pattern_index: usize,
    /// The node matched by the pattern's outermost step.
    pub node: SyntaxNode<'t>,
    /// Captures in pattern order.
    pub captures: Vec<QueryCapture<'t>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapture<'t> {
    pub index: u32,
    pub node: SyntaxNode<'t>,
}

impl<'t> QueryMatch<'t> {
    /// Nodes captured under `index`.
    pub fn nodes_for_capture(&self, index: u32) -> impl Iterator<Item = SyntaxNode<'t>> + '_ {
        self.captures
            .iter()
            .filter(move |capture| capture.index == index)
            .map(|capture| capture.node)
    }
}
