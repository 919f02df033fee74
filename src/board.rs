use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Number of rows on the standard board.
pub const DEFAULT_ROWS: usize = 6;
/// Number of columns on the standard board.
pub const DEFAULT_COLUMNS: usize = 7;
/// Length of the line needed to win.
pub const CONNECT: usize = 4;

/// The four scan directions as `(row step, column step)`: horizontal, vertical,
/// and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

/// The two players. `A` always moves first from the empty board.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize)]
pub enum Player {
    /// The player whose wins are counted by the search.
    A = 1,
    /// The opponent.
    B = 2,
}

impl Player {
    /// Returns the other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    fn symbol(self) -> char {
        match self {
            Player::A => 'X',
            Player::B => 'O',
        }
    }
}

/// Represents the possible outcomes of a position.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum GameOutcome {
    /// Nobody has four in a row and the board still has room.
    Ongoing = 0,
    /// Player A has four in a row.
    WinA = 1,
    /// Player B has four in a row.
    WinB = 2,
    /// The board is full and nobody has won.
    Draw = 3,
}

impl GameOutcome {
    /// Returns `true` for every outcome except `Ongoing`.
    pub fn is_terminal(self) -> bool {
        self != GameOutcome::Ongoing
    }

    fn win_for(player: Player) -> Self {
        match player {
            Player::A => GameOutcome::WinA,
            Player::B => GameOutcome::WinB,
        }
    }
}

/// Errors raised when building or changing a board from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("column {column} is out of range (board has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("board must have at least one row and one column")]
    EmptyBoard,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid cell value {value} at row {row}, column {column}")]
    InvalidCell { row: usize, column: usize, value: u8 },

    #[error("piece at row {row}, column {column} is floating above an empty cell")]
    FloatingPiece { row: usize, column: usize },

    #[error("move {index} (column {column}) was played after the game was decided")]
    GameOver { index: usize, column: usize },
}

/// A four-in-a-row position.
///
/// Cells are stored row-major with row 0 at the top, so pieces fall towards the highest
/// row index. Boards are values: every move produces a new `Board` and leaves the old
/// one untouched. The player to move is carried on the board and flips with each move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    columns: usize,
    field: Vec<Option<Player>>,
    to_move: Player,
}

impl Default for Board {
    /// Creates an empty 6x7 board with player A to move.
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// Creates an empty board of the standard size.
    pub fn new() -> Self {
        Board::with_size(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }

    /// Creates an empty board with the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(rows: usize, columns: usize) -> Self {
        assert!(rows > 0 && columns > 0, "board dimensions must be non-zero");
        Self {
            rows,
            columns,
            field: vec![None; rows * columns],
            to_move: Player::A,
        }
    }

    /// Builds a board from literal rows, top row first, using `0` for empty cells,
    /// `1` for player A and `2` for player B.
    ///
    /// The player to move is derived from the piece counts: B moves when A has more
    /// pieces on the board, A otherwise.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if height == 0 || width == 0 {
            return Err(BoardError::EmptyBoard);
        }

        let mut board = Board::with_size(height, width);
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != width {
                return Err(BoardError::RaggedRows {
                    row,
                    found: cells.len(),
                    expected: width,
                });
            }
            for (column, &value) in cells.iter().enumerate() {
                board.field[row * width + column] = match value {
                    0 => None,
                    1 => Some(Player::A),
                    2 => Some(Player::B),
                    _ => return Err(BoardError::InvalidCell { row, column, value }),
                };
            }
        }

        for column in 0..width {
            for row in 1..height {
                if board.cell(row - 1, column).is_some() && board.cell(row, column).is_none() {
                    return Err(BoardError::FloatingPiece {
                        row: row - 1,
                        column,
                    });
                }
            }
        }

        board.to_move = if board.count(Player::A) > board.count(Player::B) {
            Player::B
        } else {
            Player::A
        };
        Ok(board)
    }

    /// Replays a sequence of columns from the empty standard board, alternating
    /// players and starting with A.
    ///
    /// Moves after a line of four or a full board are rejected with
    /// [`BoardError::GameOver`].
    pub fn from_moves(columns: &[usize]) -> Result<Self, BoardError> {
        columns
            .iter()
            .enumerate()
            .try_fold(Board::new(), |board, (index, &column)| {
                if board.evaluate_outcome().is_terminal() {
                    return Err(BoardError::GameOver { index, column });
                }
                board.try_play(column)
            })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the player whose turn it is.
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Returns the content of a cell, row 0 being the top row.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the board.
    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        assert!(row < self.rows && column < self.columns, "cell out of range");
        self.field[row * self.columns + column]
    }

    /// Scans every row, column and diagonal for four equal pieces in a row.
    ///
    /// Returns a win for the owner of the first line found, otherwise `Draw` when the
    /// board is full and `Ongoing` when it is not.
    pub fn evaluate_outcome(&self) -> GameOutcome {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let Some(player) = self.cell(row, column) else {
                    continue;
                };
                if DIRECTIONS
                    .iter()
                    .any(|&direction| self.is_line(row, column, direction, player))
                {
                    return GameOutcome::win_for(player);
                }
            }
        }

        if self.is_full() {
            GameOutcome::Draw
        } else {
            GameOutcome::Ongoing
        }
    }

    /// Returns `true` if the column has at least one empty cell.
    ///
    /// # Panics
    ///
    /// Panics if `column` is not a column of this board.
    pub fn is_column_playable(&self, column: usize) -> bool {
        assert!(
            column < self.columns,
            "column {column} is out of range (board has {} columns)",
            self.columns
        );
        self.field[column].is_none()
    }

    /// Returns the playable columns in ascending order, or nothing once the game has
    /// been decided.
    pub fn legal_moves(&self) -> Vec<usize> {
        if self.evaluate_outcome().is_terminal() {
            return Vec::new();
        }

        self.playable_columns()
    }

    /// Non-full columns in ascending order, without checking for a decided game.
    pub(crate) fn playable_columns(&self) -> Vec<usize> {
        (0..self.columns)
            .filter(|&column| self.is_column_playable(column))
            .collect()
    }

    /// Drops a piece of `player` into `column` and returns the resulting board.
    ///
    /// # Panics
    ///
    /// Panics if the column is out of range or full. Check
    /// [`is_column_playable`](Self::is_column_playable) or use
    /// [`try_apply_move`](Self::try_apply_move) for unchecked input.
    pub fn apply_move(&self, player: Player, column: usize) -> Board {
        match self.try_apply_move(player, column) {
            Ok(board) => board,
            Err(err) => panic!("illegal move: {err}"),
        }
    }

    /// Checked form of [`apply_move`](Self::apply_move).
    pub fn try_apply_move(&self, player: Player, column: usize) -> Result<Board, BoardError> {
        if column >= self.columns {
            return Err(BoardError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        let row = self
            .lowest_empty_row(column)
            .ok_or(BoardError::ColumnFull(column))?;

        let mut next = self.clone();
        next.field[row * self.columns + column] = Some(player);
        next.to_move = player.opponent();
        Ok(next)
    }

    /// Plays `column` for the player to move.
    ///
    /// # Panics
    ///
    /// Panics on the same conditions as [`apply_move`](Self::apply_move).
    pub fn play(&self, column: usize) -> Board {
        self.apply_move(self.to_move, column)
    }

    /// Checked form of [`play`](Self::play).
    pub fn try_play(&self, column: usize) -> Result<Board, BoardError> {
        self.try_apply_move(self.to_move, column)
    }

    /// Number of empty cells left in a column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is not a column of this board.
    pub fn empty_cells_in_column(&self, column: usize) -> usize {
        (0..self.rows)
            .take_while(|&row| self.cell(row, column).is_none())
            .count()
    }

    /// Returns `true` when no empty cell is left.
    pub fn is_full(&self) -> bool {
        self.field.iter().all(|cell| cell.is_some())
    }

    /// Renders each row as a string, top row first.
    pub fn to_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.columns)
                    .map(|column| self.cell(row, column).map_or('.', Player::symbol))
                    .collect()
            })
            .collect()
    }

    fn lowest_empty_row(&self, column: usize) -> Option<usize> {
        (0..self.rows)
            .rev()
            .find(|&row| self.cell(row, column).is_none())
    }

    fn count(&self, player: Player) -> usize {
        self.field
            .iter()
            .filter(|&&cell| cell == Some(player))
            .count()
    }

    fn is_line(
        &self,
        row: usize,
        column: usize,
        (dr, dc): (isize, isize),
        player: Player,
    ) -> bool {
        (1..CONNECT as isize).all(|step| {
            let r = row as isize + dr * step;
            let c = column as isize + dc * step;
            r >= 0
                && c >= 0
                && (r as usize) < self.rows
                && (c as usize) < self.columns
                && self.cell(r as usize, c as usize) == Some(player)
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "|{line}|")?;
        }
        let footer: String = (0..self.columns)
            .map(|column| char::from_digit((column % 10) as u32, 10).unwrap_or('?'))
            .collect();
        write!(f, " {footer} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_bottom_row_is_win_for_a() {
        let board = Board::from_rows(&[
            [0u8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [2, 2, 2, 0, 0, 0, 0],
            [1, 1, 1, 1, 0, 0, 0],
        ])
        .unwrap();
        assert_eq!(board.evaluate_outcome(), GameOutcome::WinA);
    }

    #[test]
    fn lone_row_of_four_is_win_for_a() {
        let board = Board::from_rows(&[
            [0u8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [1, 1, 1, 1, 0, 0, 0],
        ])
        .unwrap();
        assert_eq!(board.evaluate_outcome(), GameOutcome::WinA);
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn vertical_and_diagonal_wins() {
        let vertical = Board::from_moves(&[3, 4, 3, 4, 3, 4, 3]).unwrap();
        assert_eq!(vertical.evaluate_outcome(), GameOutcome::WinA);

        // rising diagonal for B: (5,1) (4,2) (3,3) (2,4)
        let rising = Board::from_rows(&[
            [0u8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 2, 0, 0],
            [0, 0, 0, 2, 1, 0, 0],
            [0, 0, 2, 1, 1, 0, 0],
            [1, 2, 1, 2, 1, 0, 0],
        ])
        .unwrap();
        assert_eq!(rising.evaluate_outcome(), GameOutcome::WinB);

        // falling diagonal for A: (2,0) (3,1) (4,2) (5,3)
        let falling = Board::from_rows(&[
            [0u8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0, 0],
            [2, 1, 0, 0, 0, 0, 0],
            [2, 2, 1, 0, 0, 0, 0],
            [2, 1, 2, 1, 0, 0, 0],
        ])
        .unwrap();
        assert_eq!(falling.evaluate_outcome(), GameOutcome::WinA);
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board = Board::from_rows(&[
            [1u8, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
        ])
        .unwrap();
        assert_eq!(board.evaluate_outcome(), GameOutcome::Draw);
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn evaluate_outcome_is_pure() {
        let board = Board::from_moves(&[3, 3, 2, 4, 5]).unwrap();
        let snapshot = board.clone();
        let first = board.evaluate_outcome();
        let second = board.evaluate_outcome();
        assert_eq!(first, second);
        assert_eq!(board, snapshot);
    }

    #[test]
    fn apply_move_drops_to_lowest_empty_row() {
        let board = Board::new().apply_move(Player::A, 3);
        let next = board.apply_move(Player::B, 3);

        assert_eq!(board.cell(5, 3), Some(Player::A));
        assert_eq!(board.cell(4, 3), None);
        assert_eq!(next.cell(4, 3), Some(Player::B));
        assert_eq!(board.empty_cells_in_column(3), 5);
        assert_eq!(next.empty_cells_in_column(3), 4);
        assert_eq!(next.to_move(), Player::A);
    }

    #[test]
    fn apply_move_leaves_input_untouched() {
        let board = Board::new();
        let _ = board.apply_move(Player::A, 0);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn filled_column_rejects_seventh_piece() {
        let mut board = Board::new();
        let mut player = Player::A;
        for _ in 0..DEFAULT_ROWS {
            board = board.apply_move(player, 3);
            player = player.opponent();
        }

        assert!(!board.is_column_playable(3));
        assert!(!board.legal_moves().contains(&3));
        assert_eq!(board.try_apply_move(player, 3), Err(BoardError::ColumnFull(3)));
    }

    #[test]
    #[should_panic(expected = "illegal move")]
    fn apply_move_on_full_column_panics() {
        let board = Board::from_moves(&[3, 3, 3, 3, 3, 3]).unwrap();
        let _ = board.apply_move(Player::A, 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn is_column_playable_out_of_range_panics() {
        Board::new().is_column_playable(DEFAULT_COLUMNS);
    }

    #[test]
    fn try_apply_move_out_of_range() {
        assert_eq!(
            Board::new().try_apply_move(Player::A, 9),
            Err(BoardError::ColumnOutOfRange {
                column: 9,
                columns: 7
            })
        );
    }

    #[test]
    fn legal_moves_are_ascending_and_playable() {
        let board = Board::from_moves(&[0, 0, 0, 0, 0, 0, 6]).unwrap();
        let moves = board.legal_moves();
        assert_eq!(moves, vec![1, 2, 3, 4, 5, 6]);
        assert!(moves.iter().all(|&column| board.is_column_playable(column)));
    }

    #[test]
    fn from_rows_rejects_bad_literals() {
        assert_eq!(
            Board::from_rows(&[vec![0u8, 0], vec![0]]),
            Err(BoardError::RaggedRows {
                row: 1,
                found: 1,
                expected: 2
            })
        );
        assert_eq!(
            Board::from_rows(&[[0u8, 3]]),
            Err(BoardError::InvalidCell {
                row: 0,
                column: 1,
                value: 3
            })
        );
        assert_eq!(
            Board::from_rows(&[[1u8, 0], [0, 2]]),
            Err(BoardError::FloatingPiece { row: 0, column: 0 })
        );
        let empty: [[u8; 0]; 0] = [];
        assert_eq!(Board::from_rows(&empty), Err(BoardError::EmptyBoard));
    }

    #[test]
    fn from_moves_rejects_moves_after_a_win() {
        assert_eq!(
            Board::from_moves(&[0, 1, 0, 1, 0, 1, 0, 1, 1]),
            Err(BoardError::GameOver {
                index: 7,
                column: 1
            })
        );
        let decided = Board::from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        assert_eq!(decided.evaluate_outcome(), GameOutcome::WinA);
    }

    #[test]
    #[should_panic(expected = "cell out of range")]
    fn empty_cells_in_column_out_of_range_panics() {
        Board::new().empty_cells_in_column(DEFAULT_COLUMNS);
    }

    #[test]
    fn from_rows_derives_player_to_move() {
        let board = Board::from_rows(&[[0u8, 0, 0], [1, 0, 0]]).unwrap();
        assert_eq!(board.to_move(), Player::B);
        let board = Board::from_rows(&[[0u8, 0, 0], [1, 2, 0]]).unwrap();
        assert_eq!(board.to_move(), Player::A);
    }

    #[test]
    fn display_renders_rows_top_first() {
        let board = Board::from_moves(&[0, 1]).unwrap();
        let rendered = board.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), DEFAULT_ROWS + 1);
        assert_eq!(lines[5], "|XO.....|");
        assert_eq!(lines[6], " 0123456 ");
    }
}
