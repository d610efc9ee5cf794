use dtl_errors::Diagnostic;
use dtl_syntax::{GreenElement, InputEdit};
use dtl_tokenizer::LexMode;
use text_size::{TextRange, TextSize};

/// One top-level unit of a template: a content run, a comment, a raw block
/// body, or a `{{ }}` / `{% %}` pair.
///
/// Segments are parsed independently of each other, which makes them the
/// unit of reuse when reparsing after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) green: GreenElement,
    pub(crate) start: TextSize,
    /// Bytes examined while lexing, counted from `start`. At least the
    /// segment length plus one.
    pub(crate) lookahead: TextSize,
    pub(crate) start_mode: LexMode,
    pub(crate) end_mode: LexMode,
    /// Name of a well-formed tag.
    pub(crate) tag_name: Option<Box<str>>,
    /// Diagnostics relative to `start`.
    pub(crate) diagnostics: Box<[Diagnostic]>,
}

impl Segment {
    pub(crate) fn len(&self) -> TextSize {
        self.green.text_len()
    }

    pub(crate) fn end(&self) -> TextSize {
        self.start + self.len()
    }

    pub(crate) fn range(&self) -> TextRange {
        TextRange::at(self.start, self.len())
    }

    pub(crate) fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Whether `edit` replaced a byte this segment's lexing depended on.
    pub(crate) fn is_damaged_by(&self, edit: &InputEdit) -> bool {
        edit.start_byte < self.start + self.lookahead && edit.old_end_byte > self.start
    }

    /// Moves the segment to its position after `edit`, unless damaged.
    pub(crate) fn edited(&self, edit: &InputEdit) -> Option<Self> {
        if self.is_damaged_by(edit) {
            return None;
        }
        let mut segment = self.clone();
        if self.start >= edit.old_end_byte {
            segment.start = self.start - edit.old_end_byte + edit.new_end_byte;
        }
        Some(segment)
    }
}
