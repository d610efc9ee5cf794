use std::iter::Peekable;
use std::sync::Arc;

use dtl_errors::Diagnostic;
use dtl_syntax::{Point, SyntaxTree};
use dtl_tokenizer::LexMode;
use line_index::LineIndex;
use text_size::TextSize;
use tracing::debug;

use crate::blocks;
use crate::language::Language;
use crate::parser::Parser;
use crate::segment::Segment;
use crate::tree::Tree;

/// Parses `text`, taking over segments of `old` that survived its edits.
///
/// `old` must already describe `text`: every edit made to the text since the
/// old parse has to be applied with [`Tree::edit`] first.
pub(crate) fn reparse(text: &str, language: &'static Language, old: Option<&Tree>) -> Tree {
    let len = TextSize::of(text);
    let mut old_segments = old.map(|tree| tree.segments().iter()).into_iter().flatten().peekable();

    let mut segments = Vec::new();
    let mut parser: Option<Parser<'_>> = None;
    let mut lines: Option<LineIndex> = None;
    let mut offset = TextSize::new(0);
    let mut mode = LexMode::Content;
    let (mut reused, mut parsed) = (0usize, 0usize);

    while offset < len {
        if let Some(segment) = reusable(&mut old_segments, text, offset, mode) {
            parser = None;
            offset = segment.end();
            mode = segment.end_mode;
            segments.push(segment.clone());
            reused += 1;
            continue;
        }

        let parser = parser.get_or_insert_with(|| {
            let point = if offset == TextSize::new(0) {
                Point::ZERO
            } else {
                let lines = lines.get_or_insert_with(|| LineIndex::new(text));
                Point::of_offset(lines, offset)
            };
            Parser::new(text, language, offset, mode, point)
        });
        let segment = parser.segment();
        if segment.len() == TextSize::new(0) {
            break;
        }
        offset = segment.end();
        mode = segment.end_mode;
        segments.push(segment);
        parsed += 1;
    }
    debug!(reused, parsed, len = u32::from(len), "parsed template");

    assemble(segments, language, reused)
}

/// Skips old segments left behind and returns the one starting at `offset`
/// if it can stand in for a fresh parse.
fn reusable<'s>(
    old: &mut Peekable<impl Iterator<Item = &'s Segment>>,
    text: &str,
    offset: TextSize,
    mode: LexMode,
) -> Option<&'s Segment> {
    while old.next_if(|segment| segment.start < offset).is_some() {}

    let segment = old.next_if(|segment| segment.start == offset)?;
    let end = segment.end();
    let fits = end <= TextSize::of(text) && text.is_char_boundary(end.into());
    (segment.start_mode == mode && fits).then_some(segment)
}

fn assemble(segments: Vec<Segment>, language: &'static Language, reused: usize) -> Tree {
    let nested = blocks::nest(&segments, language);

    let mut diagnostics = segments
        .iter()
        .flat_map(|segment| segment.diagnostics.iter().map(|d| d.shifted(segment.start)))
        .chain(nested.diagnostics)
        .collect::<Vec<Diagnostic>>();
    diagnostics.sort_by_key(|diagnostic| diagnostic.range().start());

    Tree {
        syntax: SyntaxTree::new(nested.root),
        segments: Arc::from(segments),
        diagnostics: Arc::from(diagnostics),
        language,
        reused,
    }
}
