use crate::{ByteSpan, Position};

/// Translates block-relative coordinates into file-absolute coordinates.
///
/// For a `thalo`-typed file the block covers the whole source and the map
/// is the identity (`char_offset = 0`, `line_offset = 0`, `column_offset = 0`).
/// For a fenced block embedded in markdown, `char_offset` is the byte offset
/// of the block's first character within the file, and `line_offset`/
/// `column_offset` locate that same point in `(row, column)` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMap {
    pub char_offset: usize,
    pub line_offset: u32,
    pub column_offset: u32,
}

impl SourceMap {
    pub const IDENTITY: SourceMap = SourceMap { char_offset: 0, line_offset: 0, column_offset: 0 };

    pub fn new(char_offset: usize, line_offset: u32, column_offset: u32) -> Self {
        Self { char_offset, line_offset, column_offset }
    }

    /// Maps a block-relative byte offset to a file-absolute byte offset.
    pub fn to_file_offset(&self, block_offset: usize) -> usize {
        block_offset + self.char_offset
    }

    /// Maps a block-relative position to a file-absolute position.
    ///
    /// Only the first line of the block receives `column_offset`; every
    /// later line within the block keeps its own column, since a fence's
    /// indentation only affects the first line after the opening delimiter.
    pub fn to_file_position(&self, block_position: Position) -> Position {
        let row = block_position.row + self.line_offset;
        let column =
            if block_position.row == 0 { block_position.column + self.column_offset } else { block_position.column };
        Position::new(row, column)
    }

    pub fn to_file_span(&self, block_span: ByteSpan) -> ByteSpan {
        block_span.shifted(self.char_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_map_is_a_no_op() {
        let map = SourceMap::IDENTITY;
        assert_eq!(map.to_file_offset(42), 42);
        assert_eq!(map.to_file_position(Position::new(3, 5)), Position::new(3, 5));
    }

    #[test]
    fn offsets_first_line_column_only() {
        let map = SourceMap::new(20, 2, 4);
        assert_eq!(map.to_file_position(Position::new(0, 0)), Position::new(2, 4));
        assert_eq!(map.to_file_position(Position::new(1, 0)), Position::new(3, 0));
        assert_eq!(map.to_file_offset(0), 20);
    }
}
