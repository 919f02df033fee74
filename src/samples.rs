//! Named sample positions for the driver and for tests.

use crate::board::{Board, BoardError};

/// Late position with only the two edge columns open; A to move.
pub const ENDGAME: [[u8; 7]; 6] = [
    [0, 1, 2, 2, 1, 2, 0],
    [0, 1, 1, 2, 2, 1, 0],
    [0, 2, 2, 2, 1, 2, 0],
    [0, 1, 1, 1, 2, 1, 0],
    [0, 1, 2, 2, 1, 2, 0],
    [2, 1, 1, 1, 2, 2, 1],
];

/// A has three stacked in column 2 and is to move.
pub const A_TO_WIN: [[u8; 7]; 6] = [
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 0, 0, 0, 0],
    [0, 0, 1, 0, 0, 2, 0],
    [0, 0, 1, 0, 0, 2, 2],
];

/// A's bottom-row threat on both ends; B is to move and can block only one side.
pub const DOUBLE_THREAT: [[u8; 7]; 6] = [
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 2, 2, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0],
];

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 4] = ["empty", "endgame", "a-to-win", "double-threat"];

/// Looks up a sample position by name.
pub fn by_name(name: &str) -> Option<Result<Board, BoardError>> {
    match name {
        "empty" => Some(Ok(Board::new())),
        "endgame" => Some(Board::from_rows(&ENDGAME)),
        "a-to-win" => Some(Board::from_rows(&A_TO_WIN)),
        "double-threat" => Some(Board::from_rows(&DOUBLE_THREAT)),
        _ => None,
    }
}
