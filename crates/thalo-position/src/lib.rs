//! Position tracking primitives shared by every layer of thalo.
//!
//! Every AST node carries a [`Location`] in *block-relative* byte/line
//! coordinates (data-model invariant 1). [`LineIndex`] converts between
//! byte offsets and `(line, column)` pairs; [`SourceMap`] composes a block's
//! own offsets onto a file's coordinates for markdown-embedded blocks.

mod line_index;
mod source_map;
mod span;

pub use line_index::LineIndex;
pub use source_map::SourceMap;
pub use span::{ByteSpan, Position};

use serde::{Deserialize, Serialize};

/// A source location with both byte offsets and line/column positions,
/// in block-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start_index: usize,
    pub end_index: usize,
    pub start_position: Position,
    pub end_position: Position,
}

impl Location {
    pub fn new(start_index: usize, end_index: usize, start_position: Position, end_position: Position) -> Self {
        Self { start_index, end_index, start_position, end_position }
    }

    pub fn span(&self) -> ByteSpan {
        ByteSpan::new(self.start_index, self.end_index)
    }

    /// Builds a `Location` for a byte span using a [`LineIndex`] to derive positions.
    pub fn from_span(span: ByteSpan, index: &LineIndex) -> Self {
        let start_position = index.offset_to_position(span.start);
        let end_position = index.offset_to_position(span.end);
        Self { start_index: span.start, end_index: span.end, start_position, end_position }
    }
}
