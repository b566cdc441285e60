use serde::{Deserialize, Serialize};

/// A zero-based (row, column) point, column counted in bytes as the parser reports it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Source span of a node. Both ends are treated as inclusive when testing containment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Range {
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_row, self.start_col)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        if row < self.start_row || row > self.end_row {
            return false;
        }
        if row == self.start_row && col < self.start_col {
            return false;
        }
        if row == self.end_row && col > self.end_col {
            return false;
        }
        true
    }

    /// Whether `other` lies entirely inside `self`, boundaries included.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.contains(other.start_row, other.start_col) && self.contains(other.end_row, other.end_col)
    }

    /// Number of source lines touched by the span.
    pub fn line_count(&self) -> usize {
        self.end_row.saturating_sub(self.start_row) + 1
    }
}

impl From<tree_sitter::Range> for Range {
    fn from(range: tree_sitter::Range) -> Self {
        Self {
            start_row: range.start_point.row,
            start_col: range.start_point.column,
            end_row: range.end_point.row,
            end_col: range.end_point.column,
        }
    }
}
