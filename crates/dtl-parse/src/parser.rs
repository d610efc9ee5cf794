use drop_bomb::DropBomb;
use dtl_errors::Diagnostic;
use dtl_syntax::{Builder, GreenElement, Point, SyntaxKind, SyntaxSet};
use dtl_tokenizer::{LexMode, Token, Tokenizer};
use text_size::{TextRange, TextSize};

use crate::language::Language;
use crate::segment::Segment;

/// Event-based parser over one segment at a time.
///
/// Whitespace is held back in `trivia` and flushed right before the next
/// token or node start, so nodes never begin or end with whitespace.
pub(crate) struct Parser<'t> {
    text: &'t str,
    language: &'static Language,
    tokenizer: Tokenizer<'t>,
    events: Vec<Event>,
    trivia: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    segment_start: TextSize,
    last_end: TextSize,
    lookahead_end: TextSize,
    consumed: bool,
    tag_name: Option<Box<str>>,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(
        text: &'t str,
        language: &'static Language,
        offset: TextSize,
        mode: LexMode,
        point: Point,
    ) -> Self {
        let mut parser = Self {
            text,
            language,
            tokenizer: Tokenizer::at(text, offset, mode, point),
            events: Vec::new(),
            trivia: Vec::new(),
            diagnostics: Vec::new(),
            segment_start: offset,
            last_end: offset,
            lookahead_end: offset,
            consumed: false,
            tag_name: None,
        };
        parser.skip_trivia();
        parser
    }

    pub(crate) fn language(&self) -> &'static Language {
        self.language
    }

    /// Parses the segment starting at the current token.
    pub(crate) fn segment(&mut self) -> Segment {
        let first = *self.tokenizer.peek();
        self.segment_start = first.range.start();
        self.last_end = self.segment_start;
        self.lookahead_end = self.segment_start;
        self.consumed = false;
        self.tag_name = None;

        crate::grammar::segment(self);
        debug_assert!(self.trivia.is_empty(), "trivia left over at the end of a segment");

        let next = *self.tokenizer.peek();
        let end = next.range.start();
        let text_end = TextSize::of(self.text) + TextSize::new(1);
        // Ending the segment looked at most two bytes past it, at the next
        // opening delimiter or line break.
        let examined = self.lookahead_end.max((end + TextSize::new(2)).min(text_end));

        Segment {
            green: self.build(),
            start: self.segment_start,
            lookahead: examined - self.segment_start,
            start_mode: first.mode,
            end_mode: next.mode,
            tag_name: self.tag_name.take(),
            diagnostics: std::mem::take(&mut self.diagnostics).into_boxed_slice(),
        }
    }

    pub(crate) fn at_segment_end(&self) -> bool {
        let token = self.tokenizer.peek();
        token.kind == SyntaxKind::EOF || (self.consumed && token.is_boundary())
    }

    pub(crate) fn peek_kind(&self) -> SyntaxKind {
        if self.at_segment_end() { SyntaxKind::EOF } else { self.tokenizer.peek().kind }
    }

    /// Kind of the `n`-th significant token ahead, `EOF` past the segment.
    pub(crate) fn nth_kind(&self, n: usize) -> SyntaxKind {
        if n == 0 || self.at_segment_end() {
            return self.peek_kind();
        }

        let mut tokenizer = self.tokenizer.clone();
        let mut seen = 0;
        loop {
            tokenizer.next_token();
            let token = tokenizer.peek();
            if token.kind == SyntaxKind::EOF || token.is_boundary() {
                return SyntaxKind::EOF;
            }
            if token.kind.is_trivia() {
                continue;
            }
            seen += 1;
            if seen == n {
                return token.kind;
            }
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_any(&self, set: &SyntaxSet) -> bool {
        set.contains(self.peek_kind())
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Text of the current token, empty at the end of the segment.
    pub(crate) fn current_text(&self) -> &'t str {
        if self.at_segment_end() {
            return "";
        }
        &self.text[self.tokenizer.peek().range]
    }

    /// Start of the current token.
    pub(crate) fn offset(&self) -> TextSize {
        if self.at_segment_end() { self.last_end } else { self.tokenizer.peek().range.start() }
    }

    /// End of the last significant token.
    pub(crate) fn last_end(&self) -> TextSize {
        self.last_end
    }

    pub(crate) fn text_of(&self, range: TextRange) -> &'t str {
        &self.text[range]
    }

    pub(crate) fn advance(&mut self) {
        let kind = self.peek_kind();
        self.advance_remap(kind);
    }

    /// Consumes the current token as `kind`.
    pub(crate) fn advance_remap(&mut self, kind: SyntaxKind) {
        if self.at_segment_end() {
            return;
        }

        self.flush_trivia();
        let token = self.tokenizer.next_token();
        self.note(&token);
        self.events.push(Event::Token { kind, len: token.range.len() });
        self.last_end = token.range.end();
        self.consumed = true;
        self.skip_trivia();
    }

    /// Records the current token as the tag name of this segment.
    pub(crate) fn set_tag_name(&mut self) {
        self.tag_name = Some(self.current_text().into());
    }

    pub(crate) fn clear_tag_name(&mut self) {
        self.tag_name = None;
    }

    fn note(&mut self, token: &Token) {
        self.lookahead_end = self.lookahead_end.max(token.lookahead_end);
    }

    fn skip_trivia(&mut self) {
        while self.tokenizer.peek().kind.is_trivia() {
            let token = self.tokenizer.next_token();
            self.note(&token);
            self.trivia.push(token);
        }
    }

    pub(crate) fn flush_trivia(&mut self) {
        for token in self.trivia.drain(..) {
            self.events.push(Event::Token { kind: token.kind, len: token.range.len() });
        }
    }

    pub(crate) fn start(&mut self) -> Marker {
        self.flush_trivia();
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    /// Reports an error at the current token.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let range = if self.at_segment_end() {
            TextRange::empty(self.last_end)
        } else {
            self.tokenizer.peek().range
        };
        self.error_at(range, message);
    }

    pub(crate) fn error_at(&mut self, range: TextRange, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(message, range - self.segment_start));
    }

    /// Range from the start of the segment to the last significant token.
    pub(crate) fn segment_range(&self) -> TextRange {
        TextRange::new(self.segment_start, self.last_end)
    }

    fn build(&mut self) -> GreenElement {
        let mut builder = Builder::new();
        let mut forward_parents = Vec::new();
        let events = &mut self.events;

        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
                Event::Start { kind, forward_parent } => {
                    if kind == SyntaxKind::TOMBSTONE {
                        continue;
                    }

                    forward_parents.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;

                        fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                            Event::Start { kind, forward_parent } => {
                                if kind != SyntaxKind::TOMBSTONE {
                                    forward_parents.push(kind);
                                }
                                forward_parent
                            }
                            _ => unreachable!(),
                        };
                    }

                    for kind in forward_parents.drain(..).rev() {
                        builder.start_node(kind);
                    }
                }
                Event::Finish => builder.finish_node(),
                Event::Token { kind, len } => builder.token(kind, len),
            }
        }

        events.clear();
        builder.finish_element()
    }
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Token { kind: SyntaxKind, len: TextSize },
    Finish,
}

impl Event {
    const TOMBSTONE: Self = Event::Start { kind: SyntaxKind::TOMBSTONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(pos: u32) -> Marker {
        Marker {
            position: pos,
            bomb: DropBomb::new("Marker must be either completed or abandoned"),
        }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => {
                *slot = kind;
            }
            _ => unreachable!(),
        }

        p.events.push(Event::Finish);
        CompletedMarker::new(self.position)
    }

    /// Drops the marker without creating a node.
    pub(crate) fn abandon(mut self, p: &mut Parser<'_>) {
        self.bomb.defuse();

        if self.position as usize == p.events.len() - 1 {
            p.events.pop();
        }
    }
}

pub(crate) struct CompletedMarker {
    pos: u32,
}

impl CompletedMarker {
    fn new(pos: u32) -> Self {
        CompletedMarker { pos }
    }

    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.start();

        match &mut p.events[self.pos as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new_pos.position - self.pos);
            }
            _ => unreachable!(),
        }

        new_pos
    }
}
