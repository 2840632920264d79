use thiserror::Error;

use crate::grid::Point;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("point {point} is outside the {rows}x{columns} grid")]
    OutOfBounds {
        point: Point,
        rows: usize,
        columns: usize,
    },

    #[error("point {0} is an obstacle")]
    Blocked(Point),

    #[error("invalid cell character {ch:?} at line {line}, column {column}")]
    InvalidCell {
        ch: char,
        line: usize,
        column: usize,
    },

    #[error("row {line} has {got} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("grid contains more than one {0} marker")]
    DuplicateMarker(char),

    #[error("invalid point {0:?}, expected \"row,col\"")]
    InvalidPoint(String),

    #[error("unknown algorithm {0:?}, expected \"dfs\" or \"bfs\"")]
    UnknownAlgorithm(String),
}

pub type Result<T, E = GridError> = std::result::Result<T, E>;
