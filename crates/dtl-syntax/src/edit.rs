use std::fmt;

use line_index::{LineCol, LineIndex};
use text_size::{TextRange, TextSize};

/// A zero-based row and byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Self = Self { row: 0, column: 0 };

    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn of_offset(lines: &LineIndex, offset: TextSize) -> Self {
        lines.line_col(offset).into()
    }

    /// The point reached after writing `text` starting at `self`.
    #[must_use]
    pub fn advanced_by(self, text: &str) -> Self {
        match text.rfind('\n') {
            Some(last_newline) => Self {
                row: self.row + text.matches('\n').count() as u32,
                column: (text.len() - last_newline - 1) as u32,
            },
            None => Self { row: self.row, column: self.column + text.len() as u32 },
        }
    }
}

impl From<LineCol> for Point {
    fn from(LineCol { line, col }: LineCol) -> Self {
        Self { row: line, column: col }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// Describes a single replacement in the text a tree was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Describes replacing `range` of `old_text` with `replacement`.
    pub fn replace(old_text: &str, range: TextRange, replacement: &str) -> Self {
        let lines = LineIndex::new(old_text);
        let start_point = Point::of_offset(&lines, range.start());

        Self {
            start_byte: range.start(),
            old_end_byte: range.end(),
            new_end_byte: range.start() + TextSize::of(replacement),
            start_point,
            old_end_point: Point::of_offset(&lines, range.end()),
            new_end_point: start_point.advanced_by(replacement),
        }
    }

    /// Signed length change.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end_byte)) - i64::from(u32::from(self.old_end_byte))
    }

    pub fn old_range(&self) -> TextRange {
        TextRange::new(self.start_byte, self.old_end_byte)
    }

    pub(crate) fn shift(&self, offset: TextSize) -> TextSize {
        offset - self.old_end_byte + self.new_end_byte
    }

    /// Maps the start of a range from the old text into the new one.
    pub fn map_start(&self, offset: TextSize) -> TextSize {
        if offset < self.start_byte {
            offset
        } else if offset >= self.old_end_byte {
            self.shift(offset)
        } else {
            self.start_byte
        }
    }

    /// Maps the end of a range from the old text into the new one.
    pub fn map_end(&self, offset: TextSize) -> TextSize {
        if offset <= self.start_byte {
            offset
        } else if offset >= self.old_end_byte {
            self.shift(offset)
        } else {
            self.new_end_byte
        }
    }

    /// Whether a node spanning `range` is affected by the edit.
    pub fn touches(&self, range: TextRange) -> bool {
        range.end() > self.start_byte && range.start() <= self.old_end_byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_computes_points() {
        let edit = InputEdit::replace("ab\ncd", TextRange::new(4.into(), 5.into()), "x\nyz");

        assert_eq!(edit.start_point, Point::new(1, 1));
        assert_eq!(edit.old_end_point, Point::new(1, 2));
        assert_eq!(edit.new_end_point, Point::new(2, 2));
        assert_eq!(edit.new_end_byte, 8.into());
        assert_eq!(edit.delta(), 3);
    }

    #[test]
    fn mapping_offsets() {
        let edit = InputEdit::replace("0123456789", TextRange::new(3.into(), 5.into()), "");

        assert_eq!(edit.map_start(2.into()), 2.into());
        assert_eq!(edit.map_start(4.into()), 3.into());
        assert_eq!(edit.map_start(7.into()), 5.into());
        assert_eq!(edit.map_end(4.into()), 3.into());
        assert_eq!(edit.map_end(9.into()), 7.into());
    }
}
