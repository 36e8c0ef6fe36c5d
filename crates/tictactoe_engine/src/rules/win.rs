//! Win detection logic for tic-tac-toe.

use tracing::instrument;

use crate::board::Board;
use crate::types::{BOARD_SIZE, Cell, Position, Side};

/// Checks whether any line through `position` is held by a single side.
///
/// The row through `y` and the column through `x` are always checked; the
/// diagonals only when `position` lies on them. A line can only become
/// complete on the move that fills its last square, so checking the lines
/// through that move is enough.
#[instrument(skip(board))]
pub fn has_winning_line_through(board: &Board, position: Position) -> bool {
    let rows = board.rows();
    let (x, y) = (position.x(), position.y());

    let row = (0..BOARD_SIZE).map(|col| rows[y][col]);
    let column = (0..BOARD_SIZE).map(|row| rows[row][x]);
    if is_complete(row) || is_complete(column) {
        return true;
    }

    if position.on_main_diagonal() && is_complete((0..BOARD_SIZE).map(|i| rows[i][i])) {
        return true;
    }

    position.on_anti_diagonal()
        && is_complete((0..BOARD_SIZE).map(|i| rows[i][BOARD_SIZE - 1 - i]))
}

/// Scans all eight lines and returns the side holding one, if any.
///
/// Unlike [`has_winning_line_through`] this looks at the whole board; it is
/// the reference the local check is tested against.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Side> {
    let rows = board.rows();
    let mut lines: Vec<[Cell; BOARD_SIZE]> = Vec::with_capacity(2 * BOARD_SIZE + 2);

    for i in 0..BOARD_SIZE {
        // Row i, column i
        lines.push(rows[i]);
        lines.push(std::array::from_fn(|r| rows[r][i]));
    }
    lines.push(std::array::from_fn(|i| rows[i][i]));
    lines.push(std::array::from_fn(|i| rows[i][BOARD_SIZE - 1 - i]));

    lines
        .into_iter()
        .find(|line| is_complete(line.iter().copied()))
        .and_then(|line| line[0].side())
}

fn is_complete(mut cells: impl Iterator<Item = Cell>) -> bool {
    match cells.next() {
        Some(first) if first.is_occupied() => cells.all(|c| c == first),
        _ => false,
    }
}
