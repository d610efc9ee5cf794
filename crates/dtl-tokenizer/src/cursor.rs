use dtl_syntax::Point;

/// Character cursor that remembers how far ahead it has looked.
///
/// `examined` is one past the last byte inspected since the last
/// [`Cursor::reset_examined`]. Looking at the end of the text counts as
/// inspecting one extra byte, so appending text invalidates such tokens.
#[derive(Clone)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    point: Point,
    examined: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str, pos: usize, point: Point) -> Self {
        Self { text, pos, point, examined: pos }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn point(&self) -> Point {
        self.point
    }

    pub(crate) fn examined(&self) -> usize {
        self.examined
    }

    pub(crate) fn reset_examined(&mut self) {
        self.examined = self.pos;
    }

    pub(crate) fn text_since(&self, start: usize) -> &'a str {
        &self.text[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn note(&mut self, end: usize) {
        self.examined = self.examined.max(end);
    }

    fn note_eof(&mut self) {
        self.note(self.text.len() + 1);
    }

    pub(crate) fn peek(&mut self) -> Option<char> {
        match self.rest().chars().next() {
            Some(c) => {
                self.note(self.pos + c.len_utf8());
                Some(c)
            }
            None => {
                self.note_eof();
                None
            }
        }
    }

    pub(crate) fn second(&mut self) -> Option<char> {
        let mut chars = self.rest().char_indices();
        chars.next();
        match chars.next() {
            Some((offset, c)) => {
                self.note(self.pos + offset + c.len_utf8());
                Some(c)
            }
            None => {
                self.note_eof();
                None
            }
        }
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.point.row += 1;
            self.point.column = 0;
        } else {
            self.point.column += c.len_utf8() as u32;
        }
        Some(c)
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&f) {
            self.advance();
        }
    }

    /// Moves to `offset`, which must be a char boundary at or after `pos`.
    pub(crate) fn advance_to(&mut self, offset: usize) {
        let skipped = &self.text[self.pos..offset];
        self.point = self.point.advanced_by(skipped);
        self.note(offset);
        self.pos = offset;
    }

    pub(crate) fn advance_to_end(&mut self) {
        self.advance_to(self.text.len());
        self.note_eof();
    }

    /// Offset of the next occurrence of `needle` at or after `from`,
    /// examining every byte up to and including it (or to the end of the text).
    pub(crate) fn find_from(&mut self, from: usize, needle: &str) -> Option<usize> {
        match self.text[from..].find(needle) {
            Some(offset) => {
                let found = from + offset;
                self.note(found + needle.len());
                Some(found)
            }
            None => {
                self.note_eof();
                None
            }
        }
    }

    /// Restores a saved position without forgetting what was examined.
    pub(crate) fn rewind(&mut self, saved: &Self) {
        self.pos = saved.pos;
        self.point = saved.point;
    }

    pub(crate) fn byte_at(&mut self, offset: usize) -> Option<u8> {
        match self.text.as_bytes().get(offset) {
            Some(byte) => {
                self.note(offset + 1);
                Some(*byte)
            }
            None => {
                self.note_eof();
                None
            }
        }
    }
}

impl Cursor<'_> {
    pub(crate) fn starts_with_at(&mut self, offset: usize, prefix: &str) -> bool {
        if self.text.len() < offset + prefix.len() {
            self.note_eof();
        } else {
            self.note(offset + prefix.len());
        }
        self.text.get(offset..).is_some_and(|rest| rest.starts_with(prefix))
    }
}
