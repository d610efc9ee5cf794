use std::fmt;
use std::sync::Arc;

use dtl_errors::{Diagnostic, UsageError};
use dtl_syntax::{InputEdit, SyntaxNode, SyntaxTree};
use text_size::{TextRange, TextSize};
use tracing::trace;

use crate::language::Language;
use crate::segment::Segment;

/// Result of parsing a template.
///
/// Cloning is cheap and clones share all of their structure. A tree never
/// changes: [`Tree::edit`] returns a new tree.
#[derive(Clone)]
pub struct Tree {
    pub(crate) syntax: SyntaxTree,
    pub(crate) segments: Arc<[Segment]>,
    pub(crate) diagnostics: Arc<[Diagnostic]>,
    pub(crate) language: &'static Language,
    pub(crate) reused: usize,
}

impl Tree {
    pub fn root(&self) -> SyntaxNode<'_> {
        self.syntax.root()
    }

    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    /// Diagnostics ordered by position.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn text_len(&self) -> TextSize {
        self.syntax.text_len()
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    pub fn has_error(&self) -> bool {
        self.root().has_error()
    }

    pub fn is_edited(&self) -> bool {
        self.syntax.is_edited()
    }

    /// Number of top-level segments the template was split into.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of segments taken over from the old tree by the parse that
    /// produced this tree.
    pub fn reused_segments(&self) -> usize {
        self.reused
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Records an edit of the parsed text.
    ///
    /// Node positions are moved to the new text and nodes overlapping the
    /// edit are flagged with [`SyntaxNode::has_changes`]. Segments whose
    /// lexing could be affected are forgotten, the remaining ones are reused
    /// by the next parse given this tree.
    pub fn edit(&self, edit: &InputEdit) -> Result<Self, UsageError> {
        let syntax = self.syntax.edit(edit)?;
        let segments =
            self.segments.iter().filter_map(|segment| segment.edited(edit)).collect::<Arc<[_]>>();
        trace!(
            kept = segments.len(),
            dropped = self.segments.len() - segments.len(),
            "edited tree"
        );
        let diagnostics = self
            .diagnostics
            .iter()
            .map(|diagnostic| {
                let start = edit.map_start(diagnostic.range().start());
                let end = edit.map_end(diagnostic.range().end()).max(start);
                Diagnostic::error(diagnostic.message(), TextRange::new(start, end))
            })
            .collect();

        Ok(Self { syntax, segments, diagnostics, language: self.language, reused: self.reused })
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.syntax == other.syntax && self.diagnostics == other.diagnostics
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("text_len", &self.text_len())
            .field("segments", &self.segments.len())
            .field("reused", &self.reused)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
